//! Product color swatches.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color {0:?}: expected #rgb or #rrggbb")]
pub struct HexColorError(pub String);

/// A `#rgb` or `#rrggbb` color value, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a hex color.
    ///
    /// # Errors
    ///
    /// Returns `HexColorError` unless the input is `#` followed by exactly
    /// three or six hex digits.
    pub fn parse(s: &str) -> Result<Self, HexColorError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| HexColorError(s.to_owned()))?;

        if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError(s.to_owned()));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the color as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = HexColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!(HexColor::parse("#FFF").unwrap().as_str(), "#fff");
        assert_eq!(HexColor::parse(" #1A2b3C ").unwrap().as_str(), "#1a2b3c");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["fff", "#ffff", "#gggggg", "#", ""] {
            assert!(HexColor::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: HexColor = serde_json::from_str("\"#abcdef\"").unwrap();
        assert_eq!(ok.as_str(), "#abcdef");
        assert!(serde_json::from_str::<HexColor>("\"red\"").is_err());
    }
}
