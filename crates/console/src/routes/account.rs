//! Signed-in operator's own account.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::RequireConsoleAuth,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, render},
};

/// Minimum length of a new password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new().route("/account/password", get(password_form).post(change_password))
}

/// Check a new password against its confirmation.
///
/// # Errors
///
/// Returns the message to show next to the password field.
pub fn check_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters");
    }
    if password != confirm {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl PasswordForm {
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.current_password.is_empty() {
            errors.add("current_password", "Current password is required");
        }
        if let Err(message) = check_new_password(&self.new_password, &self.confirm_password) {
            errors.add("new_password", message);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Template)]
#[template(path = "account/password.html")]
struct PasswordTemplate {
    layout: Layout,
    errors: FieldErrors,
}

#[instrument(skip(operator, session))]
pub async fn password_form(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    session: Session,
) -> Response {
    let template = PasswordTemplate {
        layout: Layout::new(&session, &operator, "/account/password").await,
        errors: FieldErrors::default(),
    };
    render(&template).into_response()
}

/// Change the signed-in operator's password.
#[instrument(skip(operator, state, session, form))]
pub async fn change_password(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let (errors, message) = match form.validate() {
        Ok(()) => match state
            .api_for(&operator)
            .change_password(&form.current_password, &form.new_password)
            .await
        {
            Ok(ack) => {
                tracing::info!("Password changed");
                notification::notify_success(&session, ack.message_or("Password updated"))
                    .await;
                return Ok(Redirect::to("/account/password").into_response());
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to change password");
                let errors = e.field_errors().map(FieldErrors::from).unwrap_or_default();
                (errors, e.user_message())
            }
        },
        Err(errors) => (errors, "Please check the form for errors".to_string()),
    };

    let template = PasswordTemplate {
        layout: Layout::new(&session, &operator, "/account/password")
            .await
            .with_notification(Notification::error(message)),
        errors,
    };
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_new_password() {
        assert_eq!(
            check_new_password("1234567", "1234567"),
            Err("Password must be at least 8 characters")
        );
        assert_eq!(
            check_new_password("12345678", "12345679"),
            Err("Passwords do not match")
        );
        assert!(check_new_password("12345678", "12345678").is_ok());
    }

    #[test]
    fn test_password_form_requires_current() {
        let form = PasswordForm {
            current_password: String::new(),
            new_password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("current_password"),
            Some("Current password is required")
        );
        assert_eq!(errors.get("new_password"), None);
    }
}
