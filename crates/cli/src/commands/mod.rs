//! CLI commands.
//!
//! Every command signs in with `ATELIER_EMAIL` / `ATELIER_PASSWORD` first and
//! sends its requests with the returned token.

pub mod admin;
pub mod price;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use atelier_console::api::{ApiClient, ApiError, ApiSession};
use atelier_console::bulk::BulkFormError;

/// Request timeout for CLI calls.
const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// `ATELIER_API_URL` is not a URL.
    #[error("Invalid ATELIER_API_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API rejected or failed a request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: SUPERADMIN, ADMIN, PRODUCT")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid new admin password.
    #[error("ATELIER_NEW_ADMIN_PASSWORD: {0}")]
    InvalidPassword(&'static str),

    /// Invalid bulk price request.
    #[error(transparent)]
    Price(#[from] BulkFormError),
}

fn required_env(name: &'static str) -> Result<String, CliError> {
    std::env::var(name).map_err(|_| CliError::MissingEnvVar(name))
}

/// Sign in and return a session carrying the token.
///
/// # Errors
///
/// Returns an error if the environment is incomplete or the login fails.
pub async fn connect() -> Result<ApiSession, CliError> {
    dotenvy::dotenv().ok();

    let api_url = Url::parse(&required_env("ATELIER_API_URL")?)?;
    let email = required_env("ATELIER_EMAIL")?;
    let password = SecretString::from(required_env("ATELIER_PASSWORD")?);

    let client = ApiClient::new(api_url, API_TIMEOUT)?;
    tracing::info!("Signing in as {}...", email);
    let login = client
        .session(None)
        .login(&email, password.expose_secret())
        .await?;
    tracing::info!("Signed in ({})", login.role.label());

    Ok(client.session(Some(&login.token)))
}
