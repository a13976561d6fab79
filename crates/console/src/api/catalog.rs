//! Category and product endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use atelier_core::{CategoryId, ProductId};

use super::{
    Ack, ApiError, ApiSession, BulkPriceUpdate, CatalogApi, Category, CategoryInput, Product,
    ProductInput, ProductPage,
};

#[derive(Serialize)]
struct PageQuery {
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    query: &'a str,
}

impl ApiSession {
    /// Fetch one category with its sub-categories.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        self.get(&["categories", id.as_str()]).await
    }

    /// Create a category, or update it when `input.id` is set.
    #[instrument(skip(self, input), fields(category_id = ?input.id))]
    pub async fn save_category(&self, input: &CategoryInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["categories"], Some(input)).await
    }

    /// Delete a category.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<Ack, ApiError> {
        self.send::<()>(Method::DELETE, &["categories", id.as_str()], None)
            .await
    }

    /// Fetch one product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.get(&["products", id.as_str()]).await
    }

    /// Create a product, or update it when `input.id` is set.
    #[instrument(skip(self, input), fields(product_id = ?input.id, category_id = %input.category_id))]
    pub async fn save_product(&self, input: &ProductInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["products"], Some(input)).await
    }

    /// Delete a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<Ack, ApiError> {
        self.send::<()>(Method::DELETE, &["products", id.as_str()], None)
            .await
    }
}

#[async_trait]
impl CatalogApi for ApiSession {
    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get(&["categories"]).await
    }

    #[instrument(skip(self), fields(category_id = %category))]
    async fn products_page(
        &self,
        category: &CategoryId,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        self.get_with(
            &["categories", "products", category.as_str()],
            &PageQuery { page, limit },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.send_for(
            Method::POST,
            &["product", "searchByName"],
            &SearchQuery { query },
        )
        .await
    }

    #[instrument(skip(self, update), fields(path = update.path()))]
    async fn bulk_update(&self, update: &BulkPriceUpdate) -> Result<Ack, ApiError> {
        self.send(Method::POST, &[update.path()], Some(update)).await
    }
}
