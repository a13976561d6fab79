//! Session-stored operator identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::AdminRole;

/// The signed-in operator.
///
/// Written once at login and removed on logout or when the backend answers
/// 401. Handlers receive it explicitly through the auth extractors.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleSession {
    /// Backend token sent as `x-access-token`.
    pub token: String,
    pub email: String,
    pub role: AdminRole,
    /// Key of this operator's workspace in the registry.
    pub workspace: Uuid,
}

impl ConsoleSession {
    #[must_use]
    pub fn new(token: String, email: String, role: AdminRole) -> Self {
        Self {
            token,
            email,
            role,
            workspace: Uuid::new_v4(),
        }
    }

    #[must_use]
    pub fn has_role(&self, allowed: &[AdminRole]) -> bool {
        allowed.contains(&self.role)
    }
}

impl std::fmt::Debug for ConsoleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("workspace", &self.workspace)
            .finish()
    }
}

/// Session keys.
pub mod session_keys {
    /// The signed-in [`super::ConsoleSession`].
    pub const CURRENT_OPERATOR: &str = "current_operator";

    /// The live notification.
    pub const NOTIFICATION: &str = "notification";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = ConsoleSession::new(
            "eyJhbGciOi.secret".to_string(),
            "ops@atelier.test".to_string(),
            AdminRole::Admin,
        );
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("ops@atelier.test"));
    }

    #[test]
    fn test_each_login_gets_fresh_workspace() {
        let a = ConsoleSession::new("t".into(), "a@x.io".into(), AdminRole::Product);
        let b = ConsoleSession::new("t".into(), "a@x.io".into(), AdminRole::Product);
        assert_ne!(a.workspace, b.workspace);
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let session = ConsoleSession::new("tok".into(), "a@x.io".into(), AdminRole::SuperAdmin);
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["role"], "SUPERADMIN");
        let back: ConsoleSession = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }
}
