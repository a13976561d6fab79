//! Notification banner handlers.

use axum::{Router, response::Html, routing::post};
use tower_sessions::Session;

use crate::notification;
use crate::state::AppState;

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new().route("/notifications/dismiss", post(dismiss))
}

/// Dismiss the banner; htmx swaps it for nothing.
async fn dismiss(session: Session) -> Html<&'static str> {
    notification::dismiss(&session).await;
    Html("")
}
