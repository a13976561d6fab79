//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! atelier admin list --role ADMIN
//! ATELIER_NEW_ADMIN_PASSWORD=... atelier admin create -e ops@example.com -r PRODUCT
//! atelier admin remove 65f0c0ffee
//! ```

use secrecy::{ExposeSecret, SecretString};

use atelier_console::api::{AdminFilter, AdminInput, ApiSession};
use atelier_console::routes::account::check_new_password;
use atelier_core::{AdminId, AdminRole, Email};

use super::{CliError, required_env};

fn parse_role(role: &str) -> Result<AdminRole, CliError> {
    role.parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))
}

/// List admin accounts, following pages until the last one.
///
/// # Errors
///
/// Returns an error if the role is unknown or a request fails.
pub async fn list(
    api: &ApiSession,
    role: Option<&str>,
    search: Option<String>,
) -> Result<(), CliError> {
    let role = role.map(parse_role).transpose()?;
    let mut filter = AdminFilter::default().with_role(role).with_search(search);

    loop {
        let page = api.admins(&filter).await?;
        for admin in &page.admins {
            tracing::info!(
                "{}  {:<24} {:<16} {}",
                admin.id,
                admin.email,
                admin.role.label(),
                if admin.is_active { "active" } else { "inactive" }
            );
        }

        let more = page
            .pagination
            .is_some_and(|p| filter.page < p.pages);
        if !more {
            break;
        }
        let next = filter.page + 1;
        filter = filter.with_page(next);
    }
    Ok(())
}

/// Create an admin account. The password comes from
/// `ATELIER_NEW_ADMIN_PASSWORD` so it never appears in shell history.
///
/// # Errors
///
/// Returns an error if the input is invalid or the API rejects it.
pub async fn create(api: &ApiSession, email: &str, role: &str) -> Result<(), CliError> {
    let role = parse_role(role)?;
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;
    let password = SecretString::from(required_env("ATELIER_NEW_ADMIN_PASSWORD")?);
    check_new_password(password.expose_secret(), password.expose_secret())
        .map_err(CliError::InvalidPassword)?;

    tracing::info!("Creating admin: {} ({})", email, role);
    let ack = api
        .create_admin(&AdminInput {
            email: email.into_inner(),
            role,
            is_active: true,
            password: Some(password.expose_secret().to_owned()),
        })
        .await?;
    tracing::info!("{}", ack.message_or("Admin created"));
    Ok(())
}

/// Delete an admin account.
///
/// # Errors
///
/// Returns an error if the API rejects the request.
pub async fn remove(api: &ApiSession, id: &str) -> Result<(), CliError> {
    let ack = api.delete_admin(&AdminId::new(id)).await?;
    tracing::info!("{}", ack.message_or("Admin deleted"));
    Ok(())
}
