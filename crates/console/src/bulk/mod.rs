//! Bulk price updates.
//!
//! The form has two independent choices: which products ([`ScopeKind`]) and
//! how their prices change ([`ChangeMode`]). Submitting validates the form,
//! builds one [`BulkPriceUpdate`] and sends it to the endpoint for the chosen
//! change. The form state lives in the operator's workspace between
//! requests.

pub mod search;

pub use search::{ProductSearch, SearchOutcome};

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;

use atelier_core::{CategoryId, ProductId};

use crate::api::{
    Ack, ApiError, BulkPriceUpdate, CatalogApi, Category, PriceChange, Product, ProductScope,
};

/// Which products an update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    All,
    Category,
    Search,
}

impl ScopeKind {
    pub const ALL: [Self; 3] = [Self::All, Self::Category, Self::Search];

    /// Form value, matching the payload `type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Category => "category",
            Self::Search => "products",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Products",
            Self::Category => "Products by Category",
            Self::Search => "Products by Search",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Self::All),
            "category" => Some(Self::Category),
            "products" => Some(Self::Search),
            _ => None,
        }
    }
}

/// How prices change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    Discount,
    Adjustment,
}

impl ChangeMode {
    pub const ALL: [Self; 2] = [Self::Discount, Self::Adjustment];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discount => "discount",
            Self::Adjustment => "adjustment",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Discount => "Discount",
            Self::Adjustment => "Adjustment",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "discount" => Some(Self::Discount),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Reasons a submit is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkFormError {
    #[error("Please choose which products to update")]
    MissingScope,
    #[error("Please choose a type of price change")]
    MissingMode,
    #[error("Please select a category")]
    MissingCategory,
    #[error("Please select at least one product")]
    EmptySelection,
    #[error("Please enter a valid percentage")]
    InvalidPercentage,
    #[error("Discount must be between 0 and 100")]
    DiscountOutOfRange,
    #[error("Price adjustment must be greater than -100%")]
    AdjustmentOutOfRange,
}

/// Why a submit failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] BulkFormError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A product picked through search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProduct {
    pub id: ProductId,
    pub name: String,
}

impl From<&Product> for SelectedProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
        }
    }
}

/// A category offered in the scope dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
}

/// Values posted with the submit button.
#[derive(Debug, Clone, Default)]
pub struct SubmitInput {
    pub category: Option<CategoryId>,
    pub percentage: String,
}

#[derive(Debug, Default)]
pub struct BulkPriceForm {
    scope: Option<ScopeKind>,
    mode: Option<ChangeMode>,
    category: Option<CategoryId>,
    category_options: Option<Vec<CategoryOption>>,
    percentage: String,
    selected: Vec<SelectedProduct>,
}

impl BulkPriceForm {
    #[must_use]
    pub const fn scope(&self) -> Option<ScopeKind> {
        self.scope
    }

    #[must_use]
    pub const fn mode(&self) -> Option<ChangeMode> {
        self.mode
    }

    #[must_use]
    pub const fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    #[must_use]
    pub fn percentage(&self) -> &str {
        &self.percentage
    }

    #[must_use]
    pub fn selected(&self) -> &[SelectedProduct] {
        &self.selected
    }

    #[must_use]
    pub fn category_options(&self) -> &[CategoryOption] {
        self.category_options.as_deref().unwrap_or_default()
    }

    /// Choose the product scope.
    ///
    /// Leaving the category scope drops its options, so choosing it again
    /// fetches them again.
    pub fn choose_scope(&mut self, scope: ScopeKind) {
        if self.scope == Some(scope) {
            return;
        }
        if self.scope == Some(ScopeKind::Category) {
            self.category_options = None;
            self.category = None;
        }
        self.scope = Some(scope);
    }

    pub const fn choose_mode(&mut self, mode: ChangeMode) {
        self.mode = Some(mode);
    }

    pub fn choose_category(&mut self, category: Option<CategoryId>) {
        self.category = category;
    }

    pub fn set_percentage(&mut self, text: &str) {
        text.trim().clone_into(&mut self.percentage);
    }

    /// Whether category options still have to be fetched.
    #[must_use]
    pub const fn needs_category_options(&self) -> bool {
        matches!(self.scope, Some(ScopeKind::Category)) && self.category_options.is_none()
    }

    /// Install fetched category options, unless the scope moved on meanwhile.
    pub fn set_category_options(&mut self, categories: &[Category]) {
        if self.needs_category_options() {
            self.category_options = Some(
                categories
                    .iter()
                    .map(|c| CategoryOption {
                        id: c.id.clone(),
                        name: c.name.clone(),
                    })
                    .collect(),
            );
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.selected.iter().any(|p| &p.id == id)
    }

    /// Add a product to the selection, or remove it if already selected.
    pub fn toggle(&mut self, product: SelectedProduct) {
        if self.is_selected(&product.id) {
            self.remove(&product.id);
        } else {
            self.selected.push(product);
        }
    }

    pub fn remove(&mut self, id: &ProductId) {
        self.selected.retain(|p| &p.id != id);
    }

    /// Validate the form and build the request.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: missing choices, an empty selection,
    /// or a percentage that does not parse or is out of range.
    pub fn build_request(&self) -> Result<BulkPriceUpdate, BulkFormError> {
        let scope = match self.scope.ok_or(BulkFormError::MissingScope)? {
            ScopeKind::All => ProductScope::AllProducts,
            ScopeKind::Category => ProductScope::ByCategory {
                category_id: self
                    .category
                    .clone()
                    .filter(|c| !c.as_str().is_empty())
                    .ok_or(BulkFormError::MissingCategory)?,
            },
            ScopeKind::Search => {
                if self.selected.is_empty() {
                    return Err(BulkFormError::EmptySelection);
                }
                ProductScope::BySearch {
                    product_ids: self.selected.iter().map(|p| p.id.clone()).collect(),
                }
            }
        };

        let mode = self.mode.ok_or(BulkFormError::MissingMode)?;
        let pct: Decimal = self
            .percentage
            .parse()
            .map_err(|_| BulkFormError::InvalidPercentage)?;

        let change = match mode {
            ChangeMode::Discount => {
                if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                    return Err(BulkFormError::DiscountOutOfRange);
                }
                PriceChange::Discount(pct)
            }
            ChangeMode::Adjustment => {
                if pct <= -Decimal::ONE_HUNDRED {
                    return Err(BulkFormError::AdjustmentOutOfRange);
                }
                PriceChange::Adjustment(pct)
            }
        };

        Ok(BulkPriceUpdate { scope, change })
    }

    /// Return to the initial, empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Choose a scope, fetching the category options when the category scope
/// becomes active.
///
/// # Errors
///
/// Returns the API error if the categories cannot be fetched; the scope
/// choice is kept and the next activation retries.
pub async fn activate_scope<A>(
    form: &Mutex<BulkPriceForm>,
    api: &A,
    scope: ScopeKind,
) -> Result<(), ApiError>
where
    A: CatalogApi + ?Sized,
{
    let needs_options = {
        let mut form = form.lock().await;
        form.choose_scope(scope);
        form.needs_category_options()
    };

    if needs_options {
        let categories = api.categories().await?;
        form.lock().await.set_category_options(&categories);
    }
    Ok(())
}

/// Validate and send the bulk update.
///
/// Exactly one request is sent when validation passes, none otherwise. On
/// success the form and the search are reset; on failure everything is kept
/// so the operator can retry.
///
/// # Errors
///
/// Returns [`SubmitError::Form`] for validation problems and
/// [`SubmitError::Api`] when the backend refuses the update.
pub async fn submit<A>(
    form: &Mutex<BulkPriceForm>,
    search: &ProductSearch,
    api: &A,
    input: SubmitInput,
) -> Result<Ack, SubmitError>
where
    A: CatalogApi + ?Sized,
{
    let request = {
        let mut form = form.lock().await;
        if form.scope() == Some(ScopeKind::Category) {
            form.choose_category(input.category);
        }
        form.set_percentage(&input.percentage);
        form.build_request()?
    };

    let ack = api.bulk_update(&request).await?;
    tracing::info!(path = request.path(), "Bulk price update applied");

    form.lock().await.reset();
    search.reset().await;
    Ok(ack)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::api::ProductPage;

    #[derive(Default)]
    struct BulkCatalog {
        category_fetches: AtomicUsize,
        sent: StdMutex<Vec<(String, Value)>>,
        reject: bool,
    }

    #[async_trait]
    impl CatalogApi for BulkCatalog {
        async fn categories(&self) -> Result<Vec<Category>, ApiError> {
            self.category_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                serde_json::from_value(json!({ "_id": "c1", "name": "Lighting" })).unwrap(),
                serde_json::from_value(json!({ "_id": "c2", "name": "Textiles" })).unwrap(),
            ])
        }

        async fn products_page(
            &self,
            _category: &CategoryId,
            _page: u32,
            _limit: u32,
        ) -> Result<ProductPage, ApiError> {
            Err(ApiError::NotFound)
        }

        async fn search_products(&self, _query: &str) -> Result<Vec<Product>, ApiError> {
            Ok(vec![])
        }

        async fn bulk_update(&self, update: &BulkPriceUpdate) -> Result<Ack, ApiError> {
            self.sent
                .lock()
                .unwrap()
                .push((update.path().to_string(), serde_json::to_value(update).unwrap()));
            if self.reject {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: Some("Discount already active".to_string()),
                });
            }
            Ok(Ack {
                message: Some("Prices updated".to_string()),
            })
        }
    }

    fn search() -> ProductSearch {
        ProductSearch::new(Duration::from_millis(500))
    }

    fn input(category: Option<&str>, pct: &str) -> SubmitInput {
        SubmitInput {
            category: category.map(CategoryId::new),
            percentage: pct.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_selection_never_calls_backend() {
        let form = Mutex::new(BulkPriceForm::default());
        let api = BulkCatalog::default();
        {
            let mut form = form.lock().await;
            form.choose_scope(ScopeKind::Search);
            form.choose_mode(ChangeMode::Discount);
        }

        let err = submit(&form, &search(), &api, input(None, "10"))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Form(BulkFormError::EmptySelection)));
        assert_eq!(err.to_string(), "Please select at least one product");
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_discount_sends_one_request_then_resets() {
        let form = Mutex::new(BulkPriceForm::default());
        let api = BulkCatalog::default();
        activate_scope(&form, &api, ScopeKind::Category).await.unwrap();
        form.lock().await.choose_mode(ChangeMode::Discount);

        let ack = submit(&form, &search(), &api, input(Some("c1"), "10"))
            .await
            .unwrap();

        assert_eq!(ack.message_or("done"), "Prices updated");
        let sent = api.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "updateDiscounts");
        assert_eq!(sent[0].1, json!({ "type": "category", "id": "c1", "discount": 10 }));

        let form = form.lock().await;
        assert_eq!(form.scope(), None);
        assert_eq!(form.mode(), None);
        assert_eq!(form.category(), None);
        assert_eq!(form.percentage(), "");
    }

    #[tokio::test]
    async fn test_adjustment_by_search_uses_update_price() {
        let form = Mutex::new(BulkPriceForm::default());
        let api = BulkCatalog::default();
        {
            let mut form = form.lock().await;
            form.choose_scope(ScopeKind::Search);
            form.choose_mode(ChangeMode::Adjustment);
            form.toggle(SelectedProduct {
                id: ProductId::new("p1"),
                name: "Lamp".to_string(),
            });
            form.toggle(SelectedProduct {
                id: ProductId::new("p2"),
                name: "Rug".to_string(),
            });
        }

        submit(&form, &search(), &api, input(None, "-7.5")).await.unwrap();

        let sent = api.sent.lock().unwrap().clone();
        assert_eq!(sent[0].0, "updatePrice");
        assert_eq!(
            sent[0].1,
            json!({ "type": "products", "bulkIds": ["p1", "p2"], "percentage": -7.5 })
        );
        assert!(form.lock().await.selected().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_state() {
        let form = Mutex::new(BulkPriceForm::default());
        let api = BulkCatalog {
            reject: true,
            ..BulkCatalog::default()
        };
        {
            let mut form = form.lock().await;
            form.choose_scope(ScopeKind::All);
            form.choose_mode(ChangeMode::Discount);
        }

        let err = submit(&form, &search(), &api, input(None, "25"))
            .await
            .unwrap_err();

        let SubmitError::Api(err) = err else {
            panic!("expected an API error");
        };
        assert_eq!(err.user_message(), "Discount already active");

        let form = form.lock().await;
        assert_eq!(form.scope(), Some(ScopeKind::All));
        assert_eq!(form.mode(), Some(ChangeMode::Discount));
        assert_eq!(form.percentage(), "25");
    }

    #[tokio::test]
    async fn test_category_options_fetched_once_per_activation() {
        let form = Mutex::new(BulkPriceForm::default());
        let api = BulkCatalog::default();

        activate_scope(&form, &api, ScopeKind::Category).await.unwrap();
        activate_scope(&form, &api, ScopeKind::Category).await.unwrap();
        assert_eq!(api.category_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(form.lock().await.category_options().len(), 2);

        activate_scope(&form, &api, ScopeKind::All).await.unwrap();
        assert!(form.lock().await.category_options().is_empty());

        activate_scope(&form, &api, ScopeKind::Category).await.unwrap();
        assert_eq!(api.category_fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_percentage_bounds() {
        let mut form = BulkPriceForm::default();
        form.choose_scope(ScopeKind::All);

        form.choose_mode(ChangeMode::Discount);
        for (pct, ok) in [("0", true), ("100", true), ("100.01", false), ("-1", false)] {
            form.set_percentage(pct);
            assert_eq!(form.build_request().is_ok(), ok, "discount {pct}");
        }

        form.choose_mode(ChangeMode::Adjustment);
        for (pct, ok) in [("-99.9", true), ("250", true), ("-100", false)] {
            form.set_percentage(pct);
            assert_eq!(form.build_request().is_ok(), ok, "adjustment {pct}");
        }

        form.set_percentage("ten");
        assert_eq!(form.build_request(), Err(BulkFormError::InvalidPercentage));
    }

    #[test]
    fn test_missing_choices() {
        let mut form = BulkPriceForm::default();
        assert_eq!(form.build_request(), Err(BulkFormError::MissingScope));

        form.choose_scope(ScopeKind::Category);
        assert_eq!(form.build_request(), Err(BulkFormError::MissingCategory));

        form.choose_category(Some(CategoryId::new("c1")));
        assert_eq!(form.build_request(), Err(BulkFormError::MissingMode));
    }

    #[test]
    fn test_toggle_selection() {
        let mut form = BulkPriceForm::default();
        let lamp = SelectedProduct {
            id: ProductId::new("p1"),
            name: "Lamp".to_string(),
        };

        form.toggle(lamp.clone());
        assert!(form.is_selected(&lamp.id));

        form.toggle(lamp.clone());
        assert!(!form.is_selected(&lamp.id));

        form.toggle(lamp.clone());
        form.remove(&lamp.id);
        assert!(form.selected().is_empty());
    }
}
