//! Category route handlers.
//!
//! The category list is the console's home page. Leaf categories hold
//! products; their detail page pages through them with the operator's
//! listing cache.

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

use atelier_core::CategoryId;

use crate::{
    api::{ApiSession, CatalogApi, Category, CategoryInput, Product},
    error::AppError,
    filters,
    listing,
    media::{ImageResolver, Viewport},
    middleware::RequireConsoleAuth,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, checkbox, non_blank, render},
};

use super::PageQuery;
use super::products::{ProductFormInput, ProductFormTemplate, save_product};

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/categories", post(save))
        .route("/categories/new", get(new_category))
        .route("/categories/{id}", get(show))
        .route("/categories/{id}/edit", get(edit))
        .route("/categories/{id}/delete", post(delete))
        .route("/categories/{id}/products", post(add_product))
        .route("/categories/{id}/products/new", get(new_product))
}

// =============================================================================
// Views
// =============================================================================

/// Category view for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub icon_url: Option<String>,
    pub is_visible: bool,
    pub is_leaf: bool,
    pub sub_categories: Vec<CategoryView>,
}

impl CategoryView {
    fn new(category: &Category, media: &ImageResolver, compact: bool) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            description: category.description.clone(),
            image_url: media.resolve(category.cover_image.as_deref(), compact),
            icon_url: category
                .icon
                .as_deref()
                .filter(|i| !i.trim().is_empty())
                .map(|i| media.resolve(Some(i), true)),
            is_visible: category.is_visible,
            is_leaf: category.is_leaf(),
            sub_categories: category
                .sub_categories
                .iter()
                .map(|c| Self::new(c, media, compact))
                .collect(),
        }
    }
}

/// Product card on the category detail page.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub colors: Vec<String>,
    pub is_visible: bool,
}

impl ProductCard {
    fn new(product: &Product, media: &ImageResolver, compact: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            image_url: media.resolve(
                product.product_images.first().map(String::as_str),
                compact,
            ),
            colors: product.colors.clone(),
            is_visible: product.is_visible,
        }
    }
}

/// Pager state for the product grid.
#[derive(Debug, Clone, Copy)]
pub struct Pager {
    pub page: u32,
    pub total: u32,
}

impl Pager {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total
    }

    #[must_use]
    pub const fn prev(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next(&self) -> u32 {
        self.page + 1
    }
}

/// A parent offered in the category form.
#[derive(Debug, Clone)]
pub struct ParentOption {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Category list template.
#[derive(Template)]
#[template(path = "categories/index.html")]
struct CategoriesIndexTemplate {
    layout: Layout,
    categories: Vec<CategoryView>,
}

/// Category detail template.
#[derive(Template)]
#[template(path = "categories/show.html")]
struct CategoryShowTemplate {
    layout: Layout,
    category: CategoryView,
    products: Vec<ProductCard>,
    pager: Pager,
    load_error: Option<String>,
}

/// Category create/edit form.
#[derive(Template)]
#[template(path = "categories/form.html")]
struct CategoryFormTemplate {
    layout: Layout,
    values: CategoryFormInput,
    errors: FieldErrors,
    parents: Vec<ParentOption>,
    is_edit: bool,
}

// =============================================================================
// Request Types
// =============================================================================

/// Query for the new category form.
#[derive(Debug, Deserialize)]
pub struct NewCategoryQuery {
    pub parent: Option<String>,
}

/// Category form values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryFormInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub parent_id: String,
    pub is_visible: Option<String>,
}

impl From<&Category> for CategoryFormInput {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            description: category.description.clone(),
            icon: category.icon.clone().unwrap_or_default(),
            cover_image: category.cover_image.clone().unwrap_or_default(),
            parent_id: category
                .parent_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            is_visible: category.is_visible.then(|| "on".to_string()),
        }
    }
}

impl CategoryFormInput {
    #[must_use]
    pub fn visible(&self) -> bool {
        checkbox(self.is_visible.as_deref())
    }

    /// Validate the form into a save payload.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<CategoryInput, FieldErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("name", "Category name is required");
            return Err(errors);
        }

        Ok(CategoryInput {
            id: non_blank(&self.id).map(CategoryId::new),
            name: name.to_string(),
            description: self.description.trim().to_string(),
            icon: non_blank(&self.icon),
            cover_image: non_blank(&self.cover_image),
            parent_id: non_blank(&self.parent_id).map(CategoryId::new),
            is_visible: self.visible(),
        })
    }

    /// Where to go after saving.
    fn return_path(&self) -> String {
        match (non_blank(&self.id), non_blank(&self.parent_id)) {
            (Some(id), _) => format!("/categories/{id}"),
            (None, Some(parent)) => format!("/categories/{parent}"),
            (None, None) => "/".to_string(),
        }
    }
}

fn parent_options(categories: &[Category], editing: Option<&str>) -> Vec<ParentOption> {
    categories
        .iter()
        .filter(|c| Some(c.id.as_str()) != editing)
        .map(|c| ParentOption {
            id: c.id.to_string(),
            name: c.name.clone(),
        })
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Category list (home page).
#[instrument(skip(operator, state, session))]
pub async fn index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    let layout = Layout::new(&session, &operator, "/").await;

    let (categories, layout) = match api.categories().await {
        Ok(categories) => (categories, layout),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::error!("Failed to fetch categories: {e}");
            (vec![], layout.with_notification(Notification::error(e.user_message())))
        }
    };

    let template = CategoriesIndexTemplate {
        layout,
        categories: categories
            .iter()
            .map(|c| CategoryView::new(c, state.media(), viewport.compact))
            .collect(),
    };
    Ok(render(&template).into_response())
}

/// Category detail with paged products.
#[instrument(skip(operator, state, session))]
pub async fn show(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<CategoryId>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    let category = api.category(&id).await?;
    let mut layout = Layout::new(&session, &operator, &format!("/categories/{id}")).await;

    let mut products = Vec::new();
    let mut pager = Pager { page: 1, total: 1 };
    let mut load_error = None;

    if category.is_leaf() {
        let workspace = state.workspace(&operator).await;
        match listing::ensure_page(&workspace.listing, &api, &id, query.page()).await {
            Ok((page, hit)) => {
                products = hit
                    .products
                    .iter()
                    .map(|p| ProductCard::new(p, state.media(), viewport.compact))
                    .collect();
                pager = Pager {
                    page,
                    total: hit.pages.max(1),
                };
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::error!(category_id = %id, "Failed to fetch products: {e}");
                layout = layout.with_notification(Notification::error(e.user_message()));
                load_error = Some(e.user_message());
            }
        }
    }

    let template = CategoryShowTemplate {
        layout,
        category: CategoryView::new(&category, state.media(), viewport.compact),
        products,
        pager,
        load_error,
    };
    Ok(render(&template).into_response())
}

/// New category form. `?parent=` preselects the parent category.
#[instrument(skip(operator, state, session))]
pub async fn new_category(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NewCategoryQuery>,
) -> Result<Response, AppError> {
    let categories = state.api_for(&operator).categories().await?;
    let values = CategoryFormInput {
        parent_id: query.parent.unwrap_or_default(),
        is_visible: Some("on".to_string()),
        ..CategoryFormInput::default()
    };

    let template = CategoryFormTemplate {
        layout: Layout::new(&session, &operator, "/categories/new").await,
        values,
        errors: FieldErrors::default(),
        parents: parent_options(&categories, None),
        is_edit: false,
    };
    Ok(render(&template).into_response())
}

/// Edit category form.
#[instrument(skip(operator, state, session))]
pub async fn edit(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    let (category, categories) = tokio::try_join!(api.category(&id), api.categories())?;

    let template = CategoryFormTemplate {
        layout: Layout::new(&session, &operator, &format!("/categories/{id}")).await,
        values: CategoryFormInput::from(&category),
        errors: FieldErrors::default(),
        parents: parent_options(&categories, Some(id.as_str())),
        is_edit: true,
    };
    Ok(render(&template).into_response())
}

/// Create or update a category.
#[instrument(skip(operator, state, session, values))]
pub async fn save(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Form(values): Form<CategoryFormInput>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    let is_edit = non_blank(&values.id).is_some();

    let (errors, message) = match values.validate() {
        Ok(input) => match api.save_category(&input).await {
            Ok(ack) => {
                tracing::info!(name = %input.name, is_edit, "Category saved");
                state.workspace(&operator).await.listing.lock().await.reset();
                notification::notify_success(&session, ack.message_or("Category saved")).await;
                return Ok(Redirect::to(&values.return_path()).into_response());
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save category");
                (
                    e.field_errors().map(FieldErrors::from).unwrap_or_default(),
                    e.user_message(),
                )
            }
        },
        Err(errors) => (errors, "Please check the form for errors".to_string()),
    };

    let categories = match api.categories().await {
        Ok(categories) => categories,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to reload parent categories");
            Vec::new()
        }
    };
    let editing = non_blank(&values.id);
    let template = CategoryFormTemplate {
        layout: Layout::new(&session, &operator, "/categories/new")
            .await
            .with_notification(Notification::error(message)),
        parents: parent_options(&categories, editing.as_deref()),
        values,
        errors,
        is_edit,
    };
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}

/// Delete a category and its cover image.
#[instrument(skip(operator, state, session))]
pub async fn delete(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Redirect, AppError> {
    let api = state.api_for(&operator);
    let category = api.category(&id).await?;

    match api.delete_category(&id).await {
        Ok(ack) => {
            tracing::info!(category_id = %id, "Category deleted");
            state.workspace(&operator).await.listing.lock().await.reset();
            let images: Vec<String> = category.cover_image.into_iter().collect();
            super::remove_media(&api, &images).await?;
            notification::notify_success(&session, ack.message_or("Category deleted")).await;
            Ok(Redirect::to(
                &category
                    .parent_id
                    .map_or_else(|| "/".to_string(), |p| format!("/categories/{p}")),
            ))
        }
        Err(e) => {
            super::report(&session, e).await?;
            Ok(Redirect::to(&format!("/categories/{id}")))
        }
    }
}

/// Shown when a product action targets a category with sub-categories.
pub const NOT_A_LEAF: &str = "Products can only be managed in a category without sub-categories";

/// Whether `category` may hold products directly.
///
/// # Errors
///
/// Returns the user-facing message for a category with sub-categories.
pub fn accepts_products(category: &Category) -> Result<(), &'static str> {
    if category.is_leaf() {
        Ok(())
    } else {
        Err(NOT_A_LEAF)
    }
}

/// Fetch `id` and check it may hold products.
///
/// Returns the redirect to send instead when it may not, after leaving an
/// error notification.
///
/// # Errors
///
/// Returns an error if the category cannot be fetched.
pub async fn require_leaf(
    api: &ApiSession,
    session: &Session,
    id: &CategoryId,
) -> Result<Option<Redirect>, AppError> {
    let category = api.category(id).await?;
    match accepts_products(&category) {
        Ok(()) => Ok(None),
        Err(message) => {
            tracing::warn!(category_id = %id, "Rejected product change in a parent category");
            notification::notify_error(session, message).await;
            Ok(Some(Redirect::to(&format!("/categories/{id}"))))
        }
    }
}

/// New product form for a leaf category.
#[instrument(skip(operator, state, session))]
pub async fn new_product(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<CategoryId>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    if let Some(redirect) = require_leaf(&api, &session, &id).await? {
        return Ok(redirect.into_response());
    }

    let layout = Layout::new(&session, &operator, &format!("/categories/{id}")).await;
    let template = ProductFormTemplate::new(
        &state,
        viewport,
        layout,
        ProductFormInput::blank(&id),
        FieldErrors::default(),
        None,
    );
    Ok(render(&template).into_response())
}

/// Add a product to a leaf category.
#[instrument(skip(operator, state, session, values))]
pub async fn add_product(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<CategoryId>,
    Form(mut values): Form<ProductFormInput>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    if let Some(redirect) = require_leaf(&api, &session, &id).await? {
        return Ok(redirect.into_response());
    }

    values.category_id = id.to_string();
    save_product(&state, &session, &operator, viewport, None, id, values).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_required() {
        let errors = CategoryFormInput::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Category name is required"));
    }

    #[test]
    fn test_blank_optionals_are_omitted() {
        let values = CategoryFormInput {
            name: " Lighting ".to_string(),
            icon: "  ".to_string(),
            parent_id: "c1".to_string(),
            is_visible: Some("on".to_string()),
            ..CategoryFormInput::default()
        };
        let input = values.validate().unwrap();
        assert_eq!(input.name, "Lighting");
        assert_eq!(input.id, None);
        assert_eq!(input.icon, None);
        assert_eq!(input.parent_id, Some(CategoryId::new("c1")));
        assert!(input.is_visible);
        assert_eq!(values.return_path(), "/categories/c1");
    }

    #[test]
    fn test_only_leaf_categories_accept_products() {
        let leaf: Category =
            serde_json::from_value(serde_json::json!({ "_id": "c1", "name": "Lamps" })).unwrap();
        assert_eq!(accepts_products(&leaf), Ok(()));

        let parent: Category = serde_json::from_value(serde_json::json!({
            "_id": "c2",
            "name": "Furniture",
            "subCategories": [{ "_id": "c3", "name": "Chairs", "parentId": "c2" }]
        }))
        .unwrap();
        assert_eq!(accepts_products(&parent), Err(NOT_A_LEAF));
    }

    #[test]
    fn test_pager_bounds() {
        let first = Pager { page: 1, total: 3 };
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = Pager { page: 3, total: 3 };
        assert!(last.has_prev());
        assert!(!last.has_next());
        assert_eq!(last.prev(), 2);
    }

    #[test]
    fn test_leaf_view_from_category() {
        let category: Category = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "name": "Home",
            "subCategories": [{ "_id": "c2", "name": "Lamps", "coverImage": "cat/lamps.png" }]
        }))
        .unwrap();
        let media = ImageResolver::new("atelier");

        let view = CategoryView::new(&category, &media, false);
        assert!(!view.is_leaf);
        assert!(view.image_url.ends_with("/default.png"));
        assert!(view.sub_categories[0].is_leaf);
        assert!(view.sub_categories[0].image_url.ends_with("/cat/lamps.png"));
    }
}
