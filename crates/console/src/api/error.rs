//! Errors returned by the content API and how they read to an operator.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the content API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401: the session token is missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// 403: the signed-in role may not perform the operation.
    #[error("Forbidden")]
    Forbidden,

    /// 404: the entity does not exist.
    #[error("Not found")]
    NotFound,

    /// 409: the change conflicts with existing data.
    #[error("Conflict: {}", .0.as_deref().unwrap_or("-"))]
    Conflict(Option<String>),

    /// 400/422: the payload failed backend validation.
    #[error("Validation failed: {}", .message.as_deref().unwrap_or("-"))]
    Validation {
        message: Option<String>,
        /// Field name to message, merged from every error shape the backend uses.
        fields: BTreeMap<String, String>,
    },

    /// 5xx from the backend.
    #[error("Server error ({status})")]
    Server { status: u16 },

    /// The backend refused the request: `success: false`, or an unmapped status.
    #[error("Rejected ({status}): {}", .message.as_deref().unwrap_or("-"))]
    Rejected { status: u16, message: Option<String> },

    /// A successful response did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured base URL cannot carry request paths.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Classify a non-2xx response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let value = serde_json::from_str::<Value>(body).ok();
        let message = value.as_ref().and_then(server_message);

        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict(message),
            400 | 422 => Self::Validation {
                message,
                fields: value.as_ref().map(field_errors).unwrap_or_default(),
            },
            500..=599 => Self::Server { status },
            _ => Self::Rejected { status, message },
        }
    }

    /// Whether the error means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Field-keyed validation messages, if any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    /// The message shown to the operator for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        fn or(message: Option<&String>, fallback: &str) -> String {
            message
                .filter(|m| !m.trim().is_empty())
                .map_or_else(|| fallback.to_string(), Clone::clone)
        }

        match self {
            Self::Network(_) => "Network error - please check your connection".to_string(),
            Self::Unauthorized => "Session expired. Please login again.".to_string(),
            Self::Forbidden => "You do not have permission to perform this action".to_string(),
            Self::NotFound => "Resource not found".to_string(),
            Self::Conflict(message) => or(message.as_ref(), "Conflict occurred"),
            Self::Validation { fields, .. } if !fields.is_empty() => {
                "Please check the form for errors".to_string()
            }
            Self::Validation { message, .. } => or(message.as_ref(), "Validation error"),
            Self::Server { .. } => "Internal server error. Please try again later.".to_string(),
            Self::Rejected { message, .. } => or(message.as_ref(), "An error occurred"),
            Self::Decode(_) | Self::InvalidBaseUrl(_) => "An error occurred".to_string(),
        }
    }
}

/// Server-provided message: top-level `message`, then `error.message`, then
/// a bare string `error`.
pub(crate) fn server_message(body: &Value) -> Option<String> {
    let text = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    text(body.get("message"))
        .or_else(|| text(body.get("error").and_then(|e| e.get("message"))))
        .or_else(|| text(body.get("error")))
}

/// Merge both validation shapes into one field map.
///
/// - `errors: [{ param | field, msg | message }]`
/// - `error.details: [{ path: [name, ..] | context.key, message }]`
///
/// The first message for a field wins.
pub(crate) fn field_errors(body: &Value) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    let listed = body.get("errors").and_then(Value::as_array);
    for item in listed.into_iter().flatten() {
        let name = item
            .get("param")
            .or_else(|| item.get("field"))
            .and_then(Value::as_str);
        let message = item
            .get("msg")
            .or_else(|| item.get("message"))
            .and_then(Value::as_str);
        if let (Some(name), Some(message)) = (name, message) {
            fields
                .entry(name.to_string())
                .or_insert_with(|| message.to_string());
        }
    }

    let details = body
        .get("error")
        .and_then(|e| e.get("details"))
        .and_then(Value::as_array);
    for item in details.into_iter().flatten() {
        let name = item
            .get("path")
            .and_then(Value::as_array)
            .and_then(|path| path.first())
            .and_then(Value::as_str)
            .or_else(|| {
                item.get("context")
                    .and_then(|c| c.get("key"))
                    .and_then(Value::as_str)
            });
        let message = item.get("message").and_then(Value::as_str);
        if let (Some(name), Some(message)) = (name, message) {
            fields
                .entry(name.to_string())
                .or_insert_with(|| message.to_string());
        }
    }

    fields
}
