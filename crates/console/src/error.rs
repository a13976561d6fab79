//! Unified error handling for the console.

use askama::Template;
use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Response extension marking a response caused by an expired backend
/// session. The session expiry middleware clears the operator's session when
/// it sees it.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend no longer accepts the session token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The operator's role does not allow this.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Default page for denied access.
#[derive(Template)]
#[template(path = "forbidden.html")]
struct ForbiddenTemplate;

fn access_denied() -> Response {
    let body = ForbiddenTemplate.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Access Denied".to_string()
    });
    (StatusCode::FORBIDDEN, Html(body)).into_response()
}

/// Redirect to the login page and mark the session as expired.
pub fn session_expired() -> Response {
    let mut response = Redirect::to("/login").into_response();
    response.extensions_mut().insert(SessionExpired);
    response
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Session(_)
                | Self::Internal(_)
                | Self::Api(
                    ApiError::Network(_)
                        | ApiError::Server { .. }
                        | ApiError::Decode(_)
                        | ApiError::InvalidBaseUrl(_)
                )
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        match self {
            Self::Unauthorized | Self::Api(ApiError::Unauthorized) => session_expired(),
            Self::Forbidden | Self::Api(ApiError::Forbidden) => access_denied(),
            Self::NotFound(_) | Self::Api(ApiError::NotFound) => {
                (StatusCode::NOT_FOUND, "Resource not found").into_response()
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Api(e @ (ApiError::Network(_) | ApiError::Server { .. })) => {
                (StatusCode::BAD_GATEWAY, e.user_message()).into_response()
            }
            Self::Api(
                e @ (ApiError::Conflict(_)
                | ApiError::Validation { .. }
                | ApiError::Rejected { .. }),
            ) => (StatusCode::UNPROCESSABLE_ENTITY, e.user_message()).into_response(),
            // Don't expose internal error details to clients
            Self::Api(ApiError::Decode(_) | ApiError::InvalidBaseUrl(_))
            | Self::Session(_)
            | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "Internal server error",
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product p1".to_string());
        assert_eq!(err.to_string(), "Not found: product p1");

        let err = AppError::BadRequest("invalid page".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid page");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::Api(ApiError::Forbidden)), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::Api(ApiError::Server { status: 503 })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_marks_session_expired() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }

    #[test]
    fn test_forbidden_renders_access_denied() {
        let response = AppError::Forbidden.into_response();
        assert!(response.extensions().get::<SessionExpired>().is_none());
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
