//! Session expiry handling.
//!
//! Handlers turn a backend 401 into [`crate::error::session_expired`]. This
//! middleware sees the marker on the way out, clears the session, evicts the
//! operator's workspace and leaves a notification for the login page.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::SessionExpired;
use crate::middleware::auth::{clear_current_operator, is_htmx, login_redirect};
use crate::notification;
use crate::state::AppState;

pub async fn session_expiry(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let htmx = is_htmx(request.headers());

    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    let Some(session) = session else {
        return response;
    };

    match clear_current_operator(&session).await {
        Ok(Some(operator)) => {
            tracing::info!(operator = %operator.email, "Backend session expired");
            state.workspaces().evict(operator.workspace).await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to clear expired session"),
    }
    notification::notify_error(&session, ApiError::Unauthorized.user_message()).await;

    if htmx { login_redirect(true) } else { response }
}
