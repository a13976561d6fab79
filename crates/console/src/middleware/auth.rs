//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{ConsoleSession, session_keys};

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

/// Send the browser to the login page; htmx gets `HX-Redirect` so the whole
/// page navigates instead of swapping the login form into a fragment.
#[must_use]
pub fn login_redirect(htmx: bool) -> Response {
    if htmx {
        (
            StatusCode::OK,
            [("HX-Redirect", HeaderValue::from_static("/login"))],
        )
            .into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Extractor that requires a signed-in operator.
///
/// Requests without one are sent to `/login`.
pub struct RequireConsoleAuth(pub ConsoleSession);

/// Rejection for [`RequireConsoleAuth`].
pub enum ConsoleAuthRejection {
    /// No operator in the session.
    RedirectToLogin { htmx: bool },
    /// The session layer is missing.
    MissingSession,
}

impl IntoResponse for ConsoleAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { htmx } => login_redirect(htmx),
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn current_operator(session: &Session) -> Option<ConsoleSession> {
    session
        .get::<ConsoleSession>(session_keys::CURRENT_OPERATOR)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireConsoleAuth
where
    S: Send + Sync,
{
    type Rejection = ConsoleAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(ConsoleAuthRejection::MissingSession)?;

        let operator = current_operator(session).await.ok_or_else(|| {
            ConsoleAuthRejection::RedirectToLogin {
                htmx: is_htmx(&parts.headers),
            }
        })?;

        Ok(Self(operator))
    }
}

/// Extractor that optionally gets the signed-in operator.
pub struct OptionalConsoleAuth(pub Option<ConsoleSession>);

impl<S> FromRequestParts<S> for OptionalConsoleAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operator = match parts.extensions.get::<Session>() {
            Some(session) => current_operator(session).await,
            None => None,
        };

        Ok(Self(operator))
    }
}

/// Store the signed-in operator.
///
/// The session id is cycled so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_operator(
    session: &Session,
    operator: &ConsoleSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_OPERATOR, operator)
        .await
}

/// Remove the operator from the session (logout, expired token).
///
/// Returns the removed operator so its workspace can be evicted.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_operator(
    session: &Session,
) -> Result<Option<ConsoleSession>, tower_sessions::session::Error> {
    let operator = session
        .remove::<ConsoleSession>(session_keys::CURRENT_OPERATOR)
        .await?;
    session.flush().await?;
    Ok(operator)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use atelier_core::AdminRole;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_set_then_clear_operator() {
        let session = session();
        let operator = ConsoleSession::new("tok".into(), "ops@atelier.test".into(), AdminRole::Admin);

        set_current_operator(&session, &operator).await.unwrap();
        assert_eq!(current_operator(&session).await, Some(operator.clone()));

        let removed = clear_current_operator(&session).await.unwrap();
        assert_eq!(removed, Some(operator));
        assert_eq!(current_operator(&session).await, None);
    }

    #[test]
    fn test_htmx_login_redirect_uses_header() {
        let response = login_redirect(true);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["hx-redirect"], "/login");

        let response = login_redirect(false);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
