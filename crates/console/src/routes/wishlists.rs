//! Wishlist route handlers (read-only).

use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::Email;
use url::form_urlencoded;

use crate::{
    api::WishlistEntry,
    error::AppError,
    filters,
    media::{ImageResolver, Viewport},
    middleware::RequireConsoleAuth,
    notification::Notification,
    state::AppState,
    views::{Layout, non_blank, render},
};

/// Build the wishlists router.
pub fn router() -> Router<AppState> {
    Router::new().route("/wishlists", get(index))
}

#[derive(Debug, Default, Deserialize)]
pub struct WishlistQuery {
    pub page: Option<u32>,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct WishlistView {
    pub product_name: String,
    pub price: Decimal,
    pub image_url: String,
    pub email: String,
    pub added: String,
}

impl WishlistView {
    fn new(entry: &WishlistEntry, media: &ImageResolver, compact: bool) -> Self {
        Self {
            product_name: entry.product.name.clone(),
            price: entry.product.price,
            image_url: media.resolve(
                entry.product.product_images.first().map(String::as_str),
                compact,
            ),
            email: entry.email.clone().unwrap_or_default(),
            added: entry
                .created_at
                .map(|t| t.format("%d %b %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "wishlists/index.html")]
struct WishlistTemplate {
    layout: Layout,
    entries: Vec<WishlistView>,
    email: String,
    page: u32,
    prev_href: Option<String>,
    next_href: Option<String>,
}

/// Link to `page`, keeping the email filter.
fn page_href(page: u32, email: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.to_string());
    if !email.is_empty() {
        query.append_pair("email", email);
    }
    format!("/wishlists?{}", query.finish())
}

/// Wishlist entries, optionally for one customer.
#[instrument(skip(operator, state, session))]
pub async fn index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Query(query): Query<WishlistQuery>,
) -> Result<Response, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let mut layout = Layout::new(&session, &operator, "/wishlists").await;
    let api = state.api_for(&operator);

    let (entries, status) = match non_blank(&query.email) {
        Some(email) => match Email::parse(&email) {
            Ok(email) => (api.wishlists_by_user(email.as_str(), page).await?, StatusCode::OK),
            Err(e) => {
                layout = layout.with_notification(Notification::error(e.to_string()));
                (Vec::new(), StatusCode::UNPROCESSABLE_ENTITY)
            }
        },
        None => (api.wishlists(page).await?, StatusCode::OK),
    };

    let email = query.email.trim().to_string();
    let template = WishlistTemplate {
        layout,
        prev_href: (page > 1).then(|| page_href(page - 1, &email)),
        next_href: (!entries.is_empty()).then(|| page_href(page + 1, &email)),
        entries: entries
            .iter()
            .map(|e| WishlistView::new(e, state.media(), viewport.compact))
            .collect(),
        email,
        page,
    };
    Ok((status, render(&template)).into_response())
}
