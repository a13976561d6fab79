//! Authentication route handlers.
//!
//! Email and password login against the content API. The token it returns
//! is kept in the server-side session and never reaches the browser.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::Email;

use crate::{
    api::ApiError,
    error::AppError,
    filters,
    middleware::{OptionalConsoleAuth, clear_current_operator, set_current_operator},
    models::ConsoleSession,
    notification::{self, Notification},
    state::AppState,
    views::render,
};

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    email: String,
    error: Option<String>,
    notification: Option<Notification>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Login form fields.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Check the fields before calling the API.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn validate(&self) -> Result<Email, &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Email and password are required");
        }
        Email::parse(&self.email).map_err(|_| "Please enter a valid email address")
    }
}

/// Render the login page.
///
/// GET /login
#[instrument(skip(session, auth))]
async fn login_page(session: Session, auth: OptionalConsoleAuth) -> Response {
    if auth.0.is_some() {
        return Redirect::to("/").into_response();
    }

    render(&LoginTemplate {
        email: String::new(),
        error: None,
        notification: notification::take(&session).await,
    })
    .into_response()
}

/// Sign in and start a fresh workspace.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let rejected = |email: String, error: String| {
        let template = LoginTemplate {
            email,
            error: Some(error),
            notification: None,
        };
        (StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => return Ok(rejected(form.email, message.to_string())),
    };

    let response = match state
        .api()
        .session(None)
        .login(email.as_str(), &form.password)
        .await
    {
        Ok(response) => response,
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            return Ok(rejected(form.email, "Invalid email or password".to_string()));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Ok(rejected(form.email, e.user_message()));
        }
    };

    let operator = ConsoleSession::new(response.token, response.email, response.role);
    set_current_operator(&session, &operator).await?;
    tracing::info!(role = %operator.role, "Operator signed in");

    Ok(Redirect::to("/").into_response())
}

/// Sign out, dropping the session and the operator's workspace.
///
/// POST /logout
#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    if let Some(operator) = clear_current_operator(&session).await? {
        state.workspaces().evict(operator.workspace).await;
        tracing::info!("Operator signed out");
    }
    Ok(Redirect::to("/login"))
}
