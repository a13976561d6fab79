//! REST client for the content backend.
//!
//! Every entity the console shows lives behind this API. Requests are sent
//! through an [`ApiSession`], a cheap handle that carries the signed-in
//! operator's token in the `x-access-token` header.
//!
//! # Response handling
//!
//! - 2xx bodies are `{ success, data, message, error }`; `success: false` is
//!   reported as [`ApiError::Rejected`]
//! - Non-2xx responses are classified by [`ApiError::from_status`]
//! - A 401 from any endpoint surfaces as [`ApiError::Unauthorized`], which the
//!   HTTP layer turns into a cleared session and a redirect to `/login`

mod accounts;
mod catalog;
mod content;
mod error;
mod types;

pub use error::ApiError;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use url::Url;

use atelier_core::CategoryId;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-access-token";

/// Content API client.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot carry paths or the HTTP client
    /// fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// A request handle bound to `token`, or an anonymous one for `None`.
    #[must_use]
    pub fn session(&self, token: Option<&str>) -> ApiSession {
        ApiSession {
            client: self.clone(),
            token: token.map(str::to_string),
        }
    }

    /// Check that the API answers at all.
    ///
    /// Any HTTP response counts, including errors: only transport failures
    /// mean the backend is unreachable.
    pub async fn ping(&self) -> bool {
        self.inner
            .client
            .get(self.inner.base_url.clone())
            .send()
            .await
            .is_ok()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A request handle for one operator.
#[derive(Clone)]
pub struct ApiSession {
    client: ApiClient,
    token: Option<String>,
}

impl std::fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession")
            .field("client", &self.client)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A decoded success envelope.
struct Reply<T> {
    data: Option<T>,
    message: Option<String>,
}

impl<T> Reply<T> {
    fn into_data(self) -> Result<T, ApiError> {
        self.data
            .ok_or_else(|| ApiError::Decode("response carried no data".to_string()))
    }
}

impl ApiSession {
    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.client.endpoint(segments);
        let builder = self.client.inner.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Execute a GET request and return its `data`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self.request(Method::GET, segments).send().await?;
        handle_response::<T>(response).await?.into_data()
    }

    /// Execute a GET request with a query string and return its `data`.
    pub(crate) async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, ApiError> {
        let response = self
            .request(Method::GET, segments)
            .query(query)
            .send()
            .await?;
        handle_response::<T>(response).await?.into_data()
    }

    /// Send a JSON body and return the response `data`.
    pub(crate) async fn send_for<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(method, segments).json(body).send().await?;
        handle_response::<T>(response).await?.into_data()
    }

    /// Send a JSON body and keep only the acknowledgement.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Ack, ApiError> {
        let mut request = self.request(method, segments);
        if let Some(body) = body {
            request = request.json(body);
        }
        let reply = handle_response::<IgnoredAny>(request.send().await?).await?;
        Ok(Ack {
            message: reply.message,
        })
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Reply<T>, ApiError> {
    let status = response.status().as_u16();

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);
        tracing::debug!(status, error = %error, "API request rejected");
        return Err(error);
    }

    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Reply {
            data: None,
            message: None,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))?;

    if !envelope.success {
        let message = envelope.message.or_else(|| {
            envelope
                .error
                .as_ref()
                .and_then(|e| error::server_message(&serde_json::json!({ "error": e })))
        });
        return Err(ApiError::Rejected { status, message });
    }

    Ok(Reply {
        data: envelope.data,
        message: envelope.message,
    })
}

/// The catalog operations the listing cache and bulk flow depend on.
///
/// Implemented by [`ApiSession`]; tests substitute fakes.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Top-level categories with their sub-categories.
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    /// One page of a category's products.
    async fn products_page(
        &self,
        category: &CategoryId,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError>;

    /// Products whose name matches `query`.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError>;

    /// Apply a bulk discount or price adjustment.
    async fn bulk_update(&self, update: &BulkPriceUpdate) -> Result<Ack, ApiError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://api.atelier.test/v1/");
        assert_eq!(
            api.endpoint(&["categories", "products", "c1"]).as_str(),
            "https://api.atelier.test/v1/categories/products/c1"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let api = client("https://api.atelier.test/");
        assert_eq!(
            api.endpoint(&["products", "a/b c"]).as_str(),
            "https://api.atelier.test/products/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_unusable_base() {
        let err = ApiClient::new(Url::parse("mailto:ops@atelier.shop").unwrap(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = client("https://api.atelier.test/").session(Some("jwt-token-value"));
        let debug_output = format!("{session:?}");
        assert!(!debug_output.contains("jwt-token-value"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
