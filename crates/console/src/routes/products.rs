//! Product form route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::{CategoryId, HexColor, ProductId};

use crate::{
    api::{Product, ProductInput},
    error::AppError,
    filters,
    media::Viewport,
    middleware::RequireConsoleAuth,
    models::ConsoleSession,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, checkbox, non_blank, removed_refs, render, split_list},
};

use super::categories::require_leaf;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/{id}", get(edit).post(update))
        .route("/products/{id}/delete", post(delete))
}

/// Product form values, echoed back on validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFormInput {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    /// Comma separated hex colors.
    #[serde(default)]
    pub colors: String,
    /// One image reference per line.
    #[serde(default)]
    pub product_images: String,
    /// Image references when the form was opened.
    #[serde(default)]
    pub original_images: String,
    pub is_visible: Option<String>,
}

impl From<&Product> for ProductFormInput {
    fn from(product: &Product) -> Self {
        let images = product.product_images.join("\n");
        Self {
            category_id: product
                .category_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            name: product.name.clone(),
            description: product.clean_description(),
            price: product.price.to_string(),
            colors: product.colors.join(", "),
            product_images: images.clone(),
            original_images: images,
            is_visible: product.is_visible.then(|| "on".to_string()),
        }
    }
}

impl ProductFormInput {
    /// A blank form for a new product, visible by default.
    #[must_use]
    pub fn blank(category: &CategoryId) -> Self {
        Self {
            category_id: category.to_string(),
            is_visible: Some("on".to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        checkbox(self.is_visible.as_deref())
    }

    #[must_use]
    pub fn images(&self) -> Vec<String> {
        split_list(&self.product_images)
    }

    /// Images dropped from the form since it was opened.
    #[must_use]
    pub fn removed_images(&self) -> Vec<String> {
        removed_refs(&split_list(&self.original_images), &self.images())
    }

    /// Validate the form into a save payload.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(
        &self,
        id: Option<ProductId>,
        category: CategoryId,
    ) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Product name is required");
        }

        let price = match self.price.trim().parse::<Decimal>() {
            Ok(price) if price >= Decimal::ZERO => price,
            Ok(_) => {
                errors.add("price", "Price cannot be negative");
                Decimal::ZERO
            }
            Err(_) => {
                errors.add("price", "Price is required");
                Decimal::ZERO
            }
        };

        let mut colors = Vec::new();
        for color in split_list(&self.colors) {
            match HexColor::parse(&color) {
                Ok(color) => colors.push(color.to_string()),
                Err(e) => errors.add("colors", e.to_string()),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductInput {
            id,
            category_id: category,
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            product_images: self.images(),
            colors,
            is_visible: self.visible(),
        })
    }
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub values: ProductFormInput,
    pub errors: FieldErrors,
    pub action: String,
    pub product_id: Option<String>,
    pub previews: Vec<String>,
}

impl ProductFormTemplate {
    pub fn new(
        state: &AppState,
        viewport: Viewport,
        layout: Layout,
        values: ProductFormInput,
        errors: FieldErrors,
        product_id: Option<&ProductId>,
    ) -> Self {
        let previews = values
            .images()
            .iter()
            .map(|r| state.media().resolve(Some(r), viewport.compact))
            .collect();
        let action = product_id.map_or_else(
            || format!("/categories/{}/products", values.category_id),
            |id| format!("/products/{id}"),
        );

        Self {
            layout,
            values,
            errors,
            action,
            product_id: product_id.map(ToString::to_string),
            previews,
        }
    }
}

/// Validate and save a product, then return to its category.
///
/// Invalid input re-renders the form with field messages. A successful save
/// invalidates the operator's listing cache and removes images dropped from
/// the form.
pub async fn save_product(
    state: &AppState,
    session: &Session,
    operator: &ConsoleSession,
    viewport: Viewport,
    id: Option<ProductId>,
    category: CategoryId,
    values: ProductFormInput,
) -> Result<Response, AppError> {
    let path = id.as_ref().map_or_else(
        || format!("/categories/{category}"),
        |id| format!("/products/{id}"),
    );

    let rerender = |layout, values, errors, id: Option<&ProductId>| {
        let template = ProductFormTemplate::new(state, viewport, layout, values, errors, id);
        (StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response()
    };

    let input = match values.validate(id.clone(), category.clone()) {
        Ok(input) => input,
        Err(errors) => {
            let layout = Layout::new(session, operator, &path)
                .await
                .with_notification(Notification::error("Please check the form for errors"));
            return Ok(rerender(layout, values, errors, id.as_ref()));
        }
    };

    let api = state.api_for(operator);
    match api.save_product(&input).await {
        Ok(ack) => {
            tracing::info!(category_id = %category, product_id = ?id, "Product saved");
            state.workspace(operator).await.listing.lock().await.reset();

            let removed = values.removed_images();
            super::remove_media(&api, &removed).await?;

            notification::notify_success(session, ack.message_or("Product saved")).await;
            Ok(Redirect::to(&format!("/categories/{category}")).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to save product");
            let errors = e.field_errors().map(FieldErrors::from).unwrap_or_default();
            let layout = Layout::new(session, operator, &path)
                .await
                .with_notification(Notification::error(e.user_message()));
            Ok(rerender(layout, values, errors, id.as_ref()))
        }
    }
}

/// Product edit form.
#[instrument(skip(operator, state, session))]
pub async fn edit(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let product = state.api_for(&operator).product(&id).await?;
    let layout = Layout::new(&session, &operator, &format!("/products/{id}")).await;

    let template = ProductFormTemplate::new(
        &state,
        viewport,
        layout,
        ProductFormInput::from(&product),
        FieldErrors::default(),
        Some(&id),
    );
    Ok(render(&template).into_response())
}

/// Update a product.
#[instrument(skip(operator, state, session, values))]
pub async fn update(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<ProductId>,
    Form(values): Form<ProductFormInput>,
) -> Result<Response, AppError> {
    let category = CategoryId::new(values.category_id.trim());
    save_product(&state, &session, &operator, viewport, Some(id), category, values).await
}

/// Hidden fields posted with the delete button.
#[derive(Debug, Deserialize)]
pub struct DeleteProductForm {
    #[serde(default)]
    pub category_id: String,
}

/// Delete a product and return to page 1 of its category.
///
/// Products in a category with sub-categories are left alone.
#[instrument(skip(operator, state, session))]
pub async fn delete(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<DeleteProductForm>,
) -> Result<Redirect, AppError> {
    let api = state.api_for(&operator);
    let category = match non_blank(&form.category_id) {
        Some(category) => Some(CategoryId::new(category)),
        None => api.product(&id).await?.category_id,
    };
    if let Some(category) = &category {
        if let Some(redirect) = require_leaf(&api, &session, category).await? {
            return Ok(redirect);
        }
    }

    match api.delete_product(&id).await {
        Ok(ack) => {
            tracing::info!(product_id = %id, "Product deleted");
            state.workspace(&operator).await.listing.lock().await.reset();
            notification::notify_success(&session, ack.message_or("Product deleted")).await;
        }
        Err(e) => super::report(&session, e).await?,
    }

    Ok(category.map_or_else(
        || Redirect::to("/"),
        |category| Redirect::to(&format!("/categories/{category}?page=1")),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, colors: &str) -> ProductFormInput {
        ProductFormInput {
            name: name.to_string(),
            price: price.to_string(),
            colors: colors.to_string(),
            ..ProductFormInput::blank(&CategoryId::new("c1"))
        }
    }

    #[test]
    fn test_valid_product() {
        let input = form(" Brass Lamp ", "2499.50", "#FFF, #a1b2c3")
            .validate(None, CategoryId::new("c1"))
            .unwrap();
        assert_eq!(input.name, "Brass Lamp");
        assert_eq!(input.price, Decimal::new(249_950, 2));
        assert_eq!(input.colors, vec!["#fff", "#a1b2c3"]);
        assert!(input.is_visible);
    }

    #[test]
    fn test_invalid_product_fields() {
        let errors = form("", "-5", "red")
            .validate(None, CategoryId::new("c1"))
            .unwrap_err();
        assert_eq!(errors.get("name"), Some("Product name is required"));
        assert_eq!(errors.get("price"), Some("Price cannot be negative"));
        assert!(errors.get("colors").is_some());

        let errors = form("Lamp", "", "").validate(None, CategoryId::new("c1")).unwrap_err();
        assert_eq!(errors.get("price"), Some("Price is required"));
    }

    #[test]
    fn test_removed_images() {
        let values = ProductFormInput {
            product_images: "products/b.png".to_string(),
            original_images: "products/a.png\nproducts/b.png".to_string(),
            ..ProductFormInput::default()
        };
        assert_eq!(values.removed_images(), vec!["products/a.png"]);
    }

    #[test]
    fn test_form_from_product_strips_quotes() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "categoryId": "c1",
            "name": "Rug",
            "description": "\"Hand woven\"",
            "price": 1200,
            "productImages": ["products/rug.png"],
            "colors": ["#aa0000"],
            "isVisible": false
        }))
        .unwrap();

        let values = ProductFormInput::from(&product);
        assert_eq!(values.description, "Hand woven");
        assert_eq!(values.category_id, "c1");
        assert!(!values.visible());
        assert!(values.removed_images().is_empty());
    }
}
