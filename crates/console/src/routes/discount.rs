//! Bulk price update route handlers.
//!
//! The form lives in the operator's workspace. Scope and mode changes,
//! searches and selections are htmx requests that return fragments; the
//! final submit is a plain form post.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::{CategoryId, ProductId};

use crate::{
    bulk::{
        self, BulkPriceForm, ChangeMode, ScopeKind, SearchOutcome, SelectedProduct, SubmitError,
        SubmitInput,
    },
    api::Product,
    error::AppError,
    filters,
    guard::{BULK_PRICING, guard},
    middleware::RequireConsoleAuth,
    models::ConsoleSession,
    notification,
    state::AppState,
    views::{Layout, non_blank, render},
};

/// Build the bulk pricing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/discount", get(index).post(submit))
        .route("/products/discount/scope", post(choose_scope))
        .route("/products/discount/mode", post(choose_mode))
        .route("/products/discount/search", get(search))
        .route("/products/discount/select/{id}", post(toggle_selection))
}

// =============================================================================
// Views
// =============================================================================

/// A radio choice.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct ResultView {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct PillView {
    pub id: String,
    pub name: String,
}

/// Everything the bulk form fragments render.
#[derive(Debug, Clone)]
pub struct BulkFormView {
    pub scopes: Vec<ChoiceView>,
    pub modes: Vec<ChoiceView>,
    pub show_categories: bool,
    pub categories: Vec<CategoryChoice>,
    pub show_search: bool,
    pub results: Vec<ResultView>,
    pub selected: Vec<PillView>,
    pub percentage: String,
    pub percentage_hint: &'static str,
    pub error: Option<String>,
    /// Render the results list as an out-of-band swap.
    pub results_oob: bool,
}

impl BulkFormView {
    fn new(form: &BulkPriceForm, results: &[Product]) -> Self {
        let scopes = ScopeKind::ALL
            .iter()
            .map(|&s| ChoiceView {
                value: s.as_str(),
                label: s.label(),
                checked: form.scope() == Some(s),
            })
            .collect();
        let modes = ChangeMode::ALL
            .iter()
            .map(|&m| ChoiceView {
                value: m.as_str(),
                label: m.label(),
                checked: form.mode() == Some(m),
            })
            .collect();
        let categories = form
            .category_options()
            .iter()
            .map(|c| CategoryChoice {
                id: c.id.to_string(),
                name: c.name.clone(),
                selected: form.category() == Some(&c.id),
            })
            .collect();
        let results = results
            .iter()
            .map(|p| ResultView {
                id: p.id.to_string(),
                name: p.name.clone(),
                price: p.price,
                selected: form.is_selected(&p.id),
            })
            .collect();
        let selected = form
            .selected()
            .iter()
            .map(|p| PillView {
                id: p.id.to_string(),
                name: p.name.clone(),
            })
            .collect();
        let percentage_hint = match form.mode() {
            Some(ChangeMode::Discount) => "Between 0 and 100",
            Some(ChangeMode::Adjustment) => "Positive raises prices, negative lowers them",
            None => "Choose a change type first",
        };

        Self {
            scopes,
            modes,
            show_categories: form.scope() == Some(ScopeKind::Category),
            categories,
            show_search: form.scope() == Some(ScopeKind::Search),
            results,
            selected,
            percentage: form.percentage().to_string(),
            percentage_hint,
            error: None,
            results_oob: false,
        }
    }

    fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "discount/index.html")]
struct BulkPageTemplate {
    layout: Layout,
    view: BulkFormView,
}

#[derive(Template)]
#[template(path = "discount/_form.html")]
struct BulkFormFragment {
    view: BulkFormView,
}

#[derive(Template)]
#[template(path = "discount/_results.html")]
struct BulkResultsFragment {
    view: BulkFormView,
}

#[derive(Template)]
#[template(path = "discount/_toggle.html")]
struct BulkSelectionFragment {
    view: BulkFormView,
}

// =============================================================================
// Request Types
// =============================================================================

/// Fields posted by the scope and mode radios.
#[derive(Debug, Default, Deserialize)]
pub struct BulkFields {
    pub scope: Option<String>,
    pub mode: Option<String>,
    pub category: Option<String>,
    pub percentage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// =============================================================================
// Handlers
// =============================================================================

fn require_bulk_access(operator: &ConsoleSession) -> Result<(), AppError> {
    guard(Some(operator), BULK_PRICING, || ()).or_access_denied()
}

async fn form_view(state: &AppState, operator: &ConsoleSession) -> BulkFormView {
    let workspace = state.workspace(operator).await;
    let results = workspace.search.results().await;
    let form = workspace.bulk.lock().await;
    BulkFormView::new(&form, &results)
}

/// Keep what the operator typed across fragment swaps.
async fn remember_fields(state: &AppState, operator: &ConsoleSession, fields: &BulkFields) {
    let workspace = state.workspace(operator).await;
    let mut form = workspace.bulk.lock().await;
    if let Some(percentage) = fields.percentage.as_deref() {
        form.set_percentage(percentage);
    }
    if form.scope() == Some(ScopeKind::Category) {
        if let Some(category) = fields.category.as_deref() {
            form.choose_category(non_blank(category).map(CategoryId::new));
        }
    }
}

/// Bulk price update page.
#[instrument(skip(operator, state, session))]
pub async fn index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    require_bulk_access(&operator)?;

    let template = BulkPageTemplate {
        layout: Layout::new(&session, &operator, "/products/discount").await,
        view: form_view(&state, &operator).await,
    };
    Ok(render(&template).into_response())
}

/// Choose which products to update (htmx).
#[instrument(skip(operator, state, fields))]
pub async fn choose_scope(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    Form(fields): Form<BulkFields>,
) -> Result<Response, AppError> {
    require_bulk_access(&operator)?;

    let scope = fields
        .scope
        .as_deref()
        .and_then(ScopeKind::parse)
        .ok_or_else(|| AppError::BadRequest("Unknown product scope".to_string()))?;

    remember_fields(&state, &operator, &fields).await;

    let workspace = state.workspace(&operator).await;
    let api = state.api_for(&operator);
    let error = match bulk::activate_scope(&workspace.bulk, &api, scope).await {
        Ok(()) => None,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load category options");
            Some(e.user_message())
        }
    };

    let view = form_view(&state, &operator).await.with_error(error);
    Ok((
        StatusCode::OK,
        [("HX-Trigger", "bulk-scope-changed")],
        render(&BulkFormFragment { view }),
    )
        .into_response())
}

/// Choose how prices change (htmx).
#[instrument(skip(operator, state, fields))]
pub async fn choose_mode(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    Form(fields): Form<BulkFields>,
) -> Result<Response, AppError> {
    require_bulk_access(&operator)?;

    let mode = fields
        .mode
        .as_deref()
        .and_then(ChangeMode::parse)
        .ok_or_else(|| AppError::BadRequest("Unknown price change type".to_string()))?;

    remember_fields(&state, &operator, &fields).await;
    state
        .workspace(&operator)
        .await
        .bulk
        .lock()
        .await
        .choose_mode(mode);

    let view = form_view(&state, &operator).await;
    Ok((
        StatusCode::OK,
        [("HX-Trigger", "bulk-mode-changed")],
        render(&BulkFormFragment { view }),
    )
        .into_response())
}

/// Debounced product search (htmx).
///
/// Superseded keystrokes answer 204 so htmx leaves the results alone.
#[instrument(skip(operator, state))]
pub async fn search(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    require_bulk_access(&operator)?;

    let workspace = state.workspace(&operator).await;
    let api = state.api_for(&operator);

    let error = match workspace.search.query(&api, &query.q).await {
        Ok(SearchOutcome::Superseded) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(SearchOutcome::Results(_) | SearchOutcome::Cleared) => None,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Product search failed");
            Some(e.user_message())
        }
    };

    let view = form_view(&state, &operator).await.with_error(error);
    Ok(render(&BulkResultsFragment { view }).into_response())
}

/// Toggle a product in the selection (htmx).
#[instrument(skip(operator, state))]
pub async fn toggle_selection(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    require_bulk_access(&operator)?;

    let workspace = state.workspace(&operator).await;
    let results = workspace.search.results().await;
    {
        let mut form = workspace.bulk.lock().await;
        if form.is_selected(&id) {
            form.remove(&id);
        } else if let Some(product) = results.iter().find(|p| p.id == id) {
            form.toggle(SelectedProduct::from(product));
        }
    }

    let mut view = form_view(&state, &operator).await;
    view.results_oob = true;
    Ok((
        StatusCode::OK,
        [("HX-Trigger", "bulk-selection-changed")],
        render(&BulkSelectionFragment { view }),
    )
        .into_response())
}

/// Fields posted with the submit button.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitFields {
    pub category: Option<String>,
    #[serde(default)]
    pub percentage: String,
}

/// Apply the bulk update.
#[instrument(skip(operator, state, session, fields))]
pub async fn submit(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Form(fields): Form<SubmitFields>,
) -> Result<Redirect, AppError> {
    require_bulk_access(&operator)?;

    let workspace = state.workspace(&operator).await;
    let api = state.api_for(&operator);
    let input = SubmitInput {
        category: fields
            .category
            .as_deref()
            .and_then(non_blank)
            .map(CategoryId::new),
        percentage: fields.percentage,
    };

    match bulk::submit(&workspace.bulk, &workspace.search, &api, input).await {
        Ok(ack) => {
            notification::notify_success(&session, ack.message_or("Prices updated successfully"))
                .await;
        }
        Err(SubmitError::Form(e)) => notification::notify_error(&session, e.to_string()).await,
        Err(SubmitError::Api(e)) => super::report(&session, e).await?,
    }

    Ok(Redirect::to("/products/discount"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str) -> Product {
        serde_json::from_value(serde_json::json!({ "_id": id, "name": name, "price": 10 }))
            .unwrap()
    }

    #[test]
    fn test_view_marks_selected_results() {
        let mut form = BulkPriceForm::default();
        form.choose_scope(ScopeKind::Search);
        let results = vec![product("p1", "Lamp"), product("p2", "Rug")];
        form.toggle(SelectedProduct::from(&results[1]));

        let view = BulkFormView::new(&form, &results);
        assert!(view.show_search);
        assert!(!view.show_categories);
        assert!(!view.results[0].selected);
        assert!(view.results[1].selected);
        assert_eq!(view.selected.len(), 1);
        assert_eq!(view.selected[0].name, "Rug");
        assert!(view.scopes.iter().any(|s| s.value == "products" && s.checked));
    }

    #[test]
    fn test_view_hint_follows_mode() {
        let mut form = BulkPriceForm::default();
        assert_eq!(
            BulkFormView::new(&form, &[]).percentage_hint,
            "Choose a change type first"
        );
        form.choose_mode(ChangeMode::Discount);
        let view = BulkFormView::new(&form, &[]);
        assert_eq!(view.percentage_hint, "Between 0 and 100");
        assert!(view.modes.iter().any(|m| m.value == "discount" && m.checked));
    }
}
