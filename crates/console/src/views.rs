//! Shared view types and form helpers for templates.

use std::collections::{BTreeMap, BTreeSet};

use askama::Template;
use axum::response::Html;
use tower_sessions::Session;

use crate::guard::{ADMIN_ACCOUNTS, BULK_PRICING, guard};
use crate::models::ConsoleSession;
use crate::notification::{self, Notification};

/// Signed-in operator as shown in the navigation.
#[derive(Debug, Clone)]
pub struct OperatorView {
    pub email: String,
    pub role: String,
    pub is_super_admin: bool,
    pub can_bulk_price: bool,
}

impl From<&ConsoleSession> for OperatorView {
    fn from(operator: &ConsoleSession) -> Self {
        Self {
            email: operator.email.clone(),
            role: operator.role.label().to_string(),
            is_super_admin: guard(Some(operator), ADMIN_ACCOUNTS, || true).or_fallback(false),
            can_bulk_price: guard(Some(operator), BULK_PRICING, || true).or_fallback(false),
        }
    }
}

/// Everything the base layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub operator: OperatorView,
    pub current_path: String,
    pub notification: Option<Notification>,
}

impl Layout {
    /// Layout for `operator`, taking the live notification for display.
    pub async fn new(session: &Session, operator: &ConsoleSession, current_path: &str) -> Self {
        Self {
            operator: OperatorView::from(operator),
            current_path: current_path.to_string(),
            notification: notification::take(session).await,
        }
    }

    /// Show `notification` on this render instead of the stored one.
    #[must_use]
    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Whether `prefix` is the active navigation section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/" || self.current_path.starts_with("/categories")
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Field name to message, shown next to form inputs.
#[derive(Debug, Clone, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&BTreeMap<String, String>> for FieldErrors {
    fn from(fields: &BTreeMap<String, String>) -> Self {
        Self(fields.clone())
    }
}

/// Split a textarea of references into one entry per line or comma.
#[must_use]
pub fn split_list(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// References present in `original` but not in `kept`.
#[must_use]
pub fn removed_refs(original: &[String], kept: &[String]) -> Vec<String> {
    let kept: BTreeSet<&str> = kept.iter().map(String::as_str).collect();
    original
        .iter()
        .filter(|r| !kept.contains(r.as_str()))
        .cloned()
        .collect()
}

/// An HTML checkbox: present means checked.
#[must_use]
pub fn checkbox(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v, "on" | "true" | "1"))
}

/// Trimmed text, or `None` when blank.
#[must_use]
pub fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::AdminRole;

    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("products/a.png\n products/b.png ,\n\n,products/c.png"),
            vec!["products/a.png", "products/b.png", "products/c.png"]
        );
        assert!(split_list("  \n ").is_empty());
    }

    #[test]
    fn test_removed_refs() {
        let original = split_list("a\nb\nc");
        let kept = split_list("c\na\nd");
        assert_eq!(removed_refs(&original, &kept), vec!["b"]);
    }

    #[test]
    fn test_form_values() {
        assert!(checkbox(Some("on")));
        assert!(!checkbox(None));
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" home "), Some("home".to_string()));
    }

    #[test]
    fn test_field_errors_keep_first() {
        let mut errors = FieldErrors::default();
        errors.add("name", "Name is required");
        errors.add("name", "Name is too short");
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("price"), None);
    }

    #[test]
    fn test_operator_view() {
        let operator = ConsoleSession::new("t".into(), "pm@atelier.test".into(), AdminRole::Product);
        let view = OperatorView::from(&operator);
        assert!(!view.is_super_admin);
        assert!(view.can_bulk_price);
        assert_eq!(view.role, "Product Manager");
    }
}
