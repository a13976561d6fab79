//! Image URLs for media stored on Cloudinary.
//!
//! The backend stores bare public ids. [`ImageResolver`] turns them into
//! delivery URLs, scaled down for compact viewports.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Public id of the placeholder shown when an entity has no image.
pub const PLACEHOLDER_ID: &str = "default.png";

/// Delivery transform for compact viewports.
const COMPACT_TRANSFORM: &str = "c_scale,w_400";

/// Viewport width at or below which images are served compact.
pub const COMPACT_MAX_WIDTH: u32 = 400;

/// Builds image delivery URLs for one Cloudinary cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    base: String,
}

impl ImageResolver {
    #[must_use]
    pub fn new(cloud: &str) -> Self {
        Self {
            base: format!("https://res.cloudinary.com/{}/image/upload", cloud.trim()),
        }
    }

    /// Delivery URL for `reference`.
    ///
    /// Missing or blank references resolve to the placeholder. The reference
    /// itself is never rewritten; `compact` only adds a scaling segment.
    #[must_use]
    pub fn resolve(&self, reference: Option<&str>, compact: bool) -> String {
        let id = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(PLACEHOLDER_ID);

        if compact {
            format!("{}/{COMPACT_TRANSFORM}/{id}", self.base)
        } else {
            format!("{}/{id}", self.base)
        }
    }
}

/// Whether the requesting browser has a compact viewport.
///
/// Read from the `Sec-CH-Viewport-Width` and `Sec-CH-UA-Mobile` client hints;
/// browsers that send neither get full-size images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub compact: bool,
}

impl Viewport {
    fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let narrow = headers
            .get("sec-ch-viewport-width")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .is_some_and(|w| w <= f64::from(COMPACT_MAX_WIDTH));
        let mobile = headers
            .get("sec-ch-ua-mobile")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "?1");

        Self {
            compact: narrow || mobile,
        }
    }
}

impl<S> FromRequestParts<S> for Viewport
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn test_placeholder_for_missing_reference() {
        let media = ImageResolver::new("atelier");
        let placeholder = "https://res.cloudinary.com/atelier/image/upload/default.png";
        assert_eq!(media.resolve(None, false), placeholder);
        assert_eq!(media.resolve(Some(""), false), placeholder);
        assert_eq!(media.resolve(Some("   "), false), placeholder);
    }

    #[test]
    fn test_compact_only_adds_transform() {
        let media = ImageResolver::new("atelier");
        let full = media.resolve(Some("products/vase_01"), false);
        let compact = media.resolve(Some("products/vase_01"), true);
        assert_eq!(
            full,
            "https://res.cloudinary.com/atelier/image/upload/products/vase_01"
        );
        assert_eq!(
            compact,
            "https://res.cloudinary.com/atelier/image/upload/c_scale,w_400/products/vase_01"
        );
        assert_eq!(compact.replace("c_scale,w_400/", ""), full);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let media = ImageResolver::new("atelier");
        assert_eq!(
            media.resolve(Some("a.png"), true),
            media.resolve(Some("a.png"), true)
        );
    }

    #[test]
    fn test_viewport_client_hints() {
        let mut headers = HeaderMap::new();
        assert!(!Viewport::from_headers(&headers).compact);

        headers.insert("sec-ch-viewport-width", HeaderValue::from_static("400"));
        assert!(Viewport::from_headers(&headers).compact);

        headers.insert("sec-ch-viewport-width", HeaderValue::from_static("1280"));
        assert!(!Viewport::from_headers(&headers).compact);

        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?1"));
        assert!(Viewport::from_headers(&headers).compact);
    }
}
