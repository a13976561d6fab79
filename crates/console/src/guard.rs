//! Role-based access to screens and actions.

use atelier_core::AdminRole;

use crate::error::AppError;
use crate::models::ConsoleSession;

/// Admin account management.
pub const ADMIN_ACCOUNTS: &[AdminRole] = &[AdminRole::SuperAdmin];

/// Bulk price updates.
pub const BULK_PRICING: &[AdminRole] = &[AdminRole::SuperAdmin, AdminRole::Admin, AdminRole::Product];

/// Outcome of [`guard`].
#[derive(Debug)]
#[must_use]
pub enum Guarded<T> {
    Allowed(T),
    Denied,
}

impl<T> Guarded<T> {
    /// The content, or `fallback` when access was denied.
    pub fn or_fallback(self, fallback: T) -> T {
        match self {
            Self::Allowed(content) => content,
            Self::Denied => fallback,
        }
    }

    /// The content, or the "Access Denied" page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] when access was denied.
    pub fn or_access_denied(self) -> Result<T, AppError> {
        match self {
            Self::Allowed(content) => Ok(content),
            Self::Denied => Err(AppError::Forbidden),
        }
    }

    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Produce `content` only for a session whose role is in `allowed`.
///
/// `content` is never called for a missing session or a role outside the
/// allow-list.
pub fn guard<T>(
    session: Option<&ConsoleSession>,
    allowed: &[AdminRole],
    content: impl FnOnce() -> T,
) -> Guarded<T> {
    match session {
        Some(session) if session.has_role(allowed) => Guarded::Allowed(content()),
        Some(session) => {
            tracing::warn!(role = %session.role, "Role not allowed");
            Guarded::Denied
        }
        None => Guarded::Denied,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn session(role: AdminRole) -> ConsoleSession {
        ConsoleSession::new("token".into(), "ops@atelier.test".into(), role)
    }

    #[test]
    fn test_denied_role_never_runs_content() {
        let ran = Cell::new(false);
        let admin = session(AdminRole::Admin);

        let shown = guard(Some(&admin), ADMIN_ACCOUNTS, || {
            ran.set(true);
            "accounts"
        })
        .or_fallback("fallback");

        assert_eq!(shown, "fallback");
        assert!(!ran.get());
    }

    #[test]
    fn test_missing_session_is_denied() {
        let ran = Cell::new(false);
        let guarded = guard(None, BULK_PRICING, || ran.set(true));
        assert!(!guarded.is_allowed());
        assert!(!ran.get());
    }

    #[test]
    fn test_allowed_role_renders_content() {
        let superadmin = session(AdminRole::SuperAdmin);
        let shown = guard(Some(&superadmin), ADMIN_ACCOUNTS, || "accounts").or_fallback("fallback");
        assert_eq!(shown, "accounts");
    }

    #[test]
    fn test_default_fallback_is_forbidden() {
        let product = session(AdminRole::Product);
        let result = guard(Some(&product), ADMIN_ACCOUNTS, || ()).or_access_denied();
        assert!(matches!(result, Err(AppError::Forbidden)));

        assert!(guard(Some(&product), BULK_PRICING, || ()).or_access_denied().is_ok());
    }
}
