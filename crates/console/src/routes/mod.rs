//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /login                       POST /login          POST /logout
//!
//! # Catalog
//! GET  /                            Category list
//! GET  /categories/new              POST /categories     Create/update category
//! GET  /categories/{id}             Detail with paged products (?page=)
//! GET  /categories/{id}/edit        POST /categories/{id}/delete
//! GET  /categories/{id}/products/new
//! POST /categories/{id}/products    Add product to a leaf category
//! GET  /products/{id}               POST /products/{id}  Edit product
//! POST /products/{id}/delete
//!
//! # Bulk pricing
//! GET  /products/discount           POST /products/discount
//! POST /products/discount/scope     POST /products/discount/mode
//! GET  /products/discount/search    POST /products/discount/select/{id}
//!
//! # Content
//! GET  /banners                     GET /banners/new     POST /banners
//! POST /banners/{id}/delete
//! GET  /portfolio                   GET /portfolio/new   GET /portfolio/{id}/edit
//! POST /portfolio                   POST /portfolio/{id}/delete
//! GET  /testimonials                GET /testimonials/new
//! GET  /testimonials/{id}/edit      POST /testimonials
//! GET  /wishlists
//!
//! # Accounts
//! GET  /admins                      (super admin only)
//! GET  /admins/new                  GET /admins/{id}/edit
//! POST /admins                      POST /admins/{id}    POST /admins/{id}/delete
//! GET  /account/password            POST /account/password
//! POST /notifications/dismiss
//! ```

pub mod account;
pub mod admins;
pub mod auth;
pub mod banners;
pub mod categories;
pub mod discount;
pub mod notifications;
pub mod products;
pub mod stories;
pub mod wishlists;

use axum::Router;
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::{ApiError, ApiSession};
use crate::error::AppError;
use crate::notification;
use crate::state::AppState;

/// Build the console router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(discount::router())
        .merge(products::router())
        .merge(banners::router())
        .merge(stories::router())
        .merge(wishlists::router())
        .merge(admins::router())
        .merge(account::router())
        .merge(notifications::router())
}

/// `?page=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Report a failed action through the notification surface.
///
/// A 401 is propagated instead so the session gets cleared.
///
/// # Errors
///
/// Returns the error back when it means the session has expired.
pub async fn report(session: &Session, err: ApiError) -> Result<(), AppError> {
    if err.is_unauthorized() {
        return Err(AppError::Api(err));
    }
    tracing::warn!(error = %err, "Console action failed");
    notification::notify_error(session, err.user_message()).await;
    Ok(())
}

/// Remove media references a successful save or delete left unused.
///
/// The action itself already succeeded, so a failed removal is only logged.
/// A 401 is propagated so the session gets cleared.
///
/// # Errors
///
/// Returns the error back when it means the session has expired.
pub async fn remove_media(api: &ApiSession, refs: &[String]) -> Result<(), AppError> {
    match api.remove_assets(refs).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_unauthorized() => Err(AppError::Api(e)),
        Err(e) => {
            tracing::warn!(error = %e, count = refs.len(), "Failed to remove media");
            Ok(())
        }
    }
}
