//! The notification surface.
//!
//! One live notification per session. Any action may overwrite it; there is
//! no queue. The layout takes it when rendering, which dismisses it.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, NotificationKind::Error)
    }
}

/// Show `notification`, replacing whatever was showing.
pub async fn notify(session: &Session, notification: Notification) {
    if let Err(e) = session
        .insert(session_keys::NOTIFICATION, &notification)
        .await
    {
        tracing::warn!(error = %e, "Failed to store notification");
    }
}

pub async fn notify_success(session: &Session, message: impl Into<String>) {
    notify(session, Notification::success(message)).await;
}

pub async fn notify_error(session: &Session, message: impl Into<String>) {
    notify(session, Notification::error(message)).await;
}

/// Take the live notification for display.
pub async fn take(session: &Session) -> Option<Notification> {
    session
        .remove::<Notification>(session_keys::NOTIFICATION)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read notification");
            None
        })
}

pub async fn dismiss(session: &Session) {
    take(session).await;
}
