//! Wire types for the content API.
//!
//! Field names follow the backend's camelCase JSON; identifiers arrive as
//! `_id`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use atelier_core::{
    AdminId, AdminRole, BannerId, CategoryId, PortfolioId, ProductId, TestimonialId, WishlistId,
};

// =============================================================================
// Envelope
// =============================================================================

/// Every response is wrapped as `{ success, data, message, error }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

const fn default_true() -> bool {
    true
}

/// Acknowledgement of a write, carrying the server's message when it sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub message: Option<String>,
}

impl Ack {
    /// The server message, or `fallback` when there was none.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Credentials sent to `PUT /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login payload.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: AdminRole,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// Body of `PUT /change-password`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category. Top-level categories carry their children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_visible: bool,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub sub_categories: Vec<Category>,
}

impl Category {
    /// Only leaf categories hold products.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.sub_categories.is_empty()
    }
}

/// Create/update payload for `POST /categories`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    pub is_visible: bool,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub product_images: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub is_visible: bool,
}

impl Product {
    /// Description with the stray quote characters the backend stores removed.
    #[must_use]
    pub fn clean_description(&self) -> String {
        self.description.replace('"', "")
    }
}

/// Create/update payload for `POST /products`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub product_images: Vec<String>,
    pub colors: Vec<String>,
    pub is_visible: bool,
}

/// One page of a category's products.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    /// Total page count for the category at the requested page size.
    #[serde(default)]
    pub pages: u32,
}

// =============================================================================
// Bulk price updates
// =============================================================================

/// Which products a bulk price update touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductScope {
    AllProducts,
    ByCategory { category_id: CategoryId },
    BySearch { product_ids: Vec<ProductId> },
}

/// How prices change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceChange {
    /// Percentage discount applied to the listed price.
    Discount(Decimal),
    /// Signed percentage added to the price.
    Adjustment(Decimal),
}

/// A bulk price update request.
///
/// Serialized per variant: `{"type": "all" | "category" | "products"}`, with
/// `id` only for a category, `bulkIds` only for a product selection, and the
/// percentage under `discount` or `percentage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPriceUpdate {
    pub scope: ProductScope,
    pub change: PriceChange,
}

impl BulkPriceUpdate {
    /// Endpoint path for this kind of change.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self.change {
            PriceChange::Discount(_) => "updateDiscounts",
            PriceChange::Adjustment(_) => "updatePrice",
        }
    }
}

impl Serialize for BulkPriceUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.scope {
            ProductScope::AllProducts => map.serialize_entry("type", "all")?,
            ProductScope::ByCategory { category_id } => {
                map.serialize_entry("type", "category")?;
                map.serialize_entry("id", category_id)?;
            }
            ProductScope::BySearch { product_ids } => {
                map.serialize_entry("type", "products")?;
                map.serialize_entry("bulkIds", product_ids)?;
            }
        }
        match self.change {
            PriceChange::Discount(pct) => map.serialize_entry("discount", &Percent(pct))?,
            PriceChange::Adjustment(pct) => map.serialize_entry("percentage", &Percent(pct))?,
        }
        map.end()
    }
}

/// A percentage as a JSON number: integral values stay integers.
struct Percent(Decimal);

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0.normalize();
        match value.to_i64() {
            Some(whole) if value.fract().is_zero() => serializer.serialize_i64(whole),
            _ => serializer.serialize_f64(value.to_f64().unwrap_or_default()),
        }
    }
}

// =============================================================================
// Content
// =============================================================================

/// Sentinel `categoryId` for banners shown on the storefront home page.
pub const HOME_BANNER: &str = "home";

/// A storefront banner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: BannerId,
    pub image: String,
    /// A category id, or [`HOME_BANNER`].
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Create payload for `POST /banners`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// A titled gallery entry; portfolios and testimonials share this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story<Id> {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pictures: Vec<String>,
    #[serde(default)]
    pub is_visible: bool,
}

pub type Portfolio = Story<PortfolioId>;
pub type Testimonial = Story<TestimonialId>;

/// Create/update payload for portfolios and testimonials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryInput {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub cover_image: String,
    pub pictures: Vec<String>,
    pub is_visible: bool,
}

/// A product saved to a storefront customer's wishlist.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[serde(rename = "_id")]
    pub id: WishlistId,
    pub product: Product,
    #[serde(default, alias = "userEmail")]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `DELETE /asset`.
#[derive(Debug, Serialize)]
pub struct AssetRemoval<'a> {
    pub public_ids: &'a [String],
}

// =============================================================================
// Admin accounts
// =============================================================================

/// An admin account.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: AdminId,
    pub email: String,
    pub role: AdminRole,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload for admin accounts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInput {
    pub email: String,
    pub role: AdminRole,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Pagination block the admin list may carry.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
}

/// A page of admin accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPage {
    pub admins: Vec<Admin>,
    pub pagination: Option<Pagination>,
}

/// The admin list arrives either as `{ admins, pagination }` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AdminListData {
    Paged {
        admins: Vec<Admin>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Plain(Vec<Admin>),
}

impl From<AdminListData> for AdminPage {
    fn from(data: AdminListData) -> Self {
        match data {
            AdminListData::Paged { admins, pagination } => Self { admins, pagination },
            AdminListData::Plain(admins) => Self {
                admins,
                pagination: None,
            },
        }
    }
}

/// Default page size of the admin list.
pub const ADMIN_PAGE_LIMIT: u32 = 10;

/// Query for `GET /admins`.
///
/// Changing any filter other than the page resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFilter {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Default for AdminFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: ADMIN_PAGE_LIMIT,
            role: None,
            search: None,
            is_active: None,
        }
    }
}

impl AdminFilter {
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Option<AdminRole>) -> Self {
        if self.role != role {
            self.role = role;
            self.page = 1;
        }
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        let search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if self.search != search {
            self.search = search;
            self.page = 1;
        }
        self
    }

    #[must_use]
    pub fn with_active(mut self, is_active: Option<bool>) -> Self {
        if self.is_active != is_active {
            self.is_active = is_active;
            self.page = 1;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_bulk_payload_per_variant() {
        let all = BulkPriceUpdate {
            scope: ProductScope::AllProducts,
            change: PriceChange::Adjustment(dec("-12.5")),
        };
        assert_eq!(
            serde_json::to_value(&all).unwrap(),
            json!({ "type": "all", "percentage": -12.5 })
        );
        assert_eq!(all.path(), "updatePrice");

        let category = BulkPriceUpdate {
            scope: ProductScope::ByCategory {
                category_id: CategoryId::new("c1"),
            },
            change: PriceChange::Discount(dec("10")),
        };
        assert_eq!(
            serde_json::to_value(&category).unwrap(),
            json!({ "type": "category", "id": "c1", "discount": 10 })
        );
        assert_eq!(category.path(), "updateDiscounts");

        let search = BulkPriceUpdate {
            scope: ProductScope::BySearch {
                product_ids: vec![ProductId::new("p1"), ProductId::new("p2")],
            },
            change: PriceChange::Discount(dec("15.0")),
        };
        assert_eq!(
            serde_json::to_value(&search).unwrap(),
            json!({ "type": "products", "bulkIds": ["p1", "p2"], "discount": 15 })
        );
    }

    #[test]
    fn test_product_accepts_numeric_price_and_sparse_fields() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Linen Throw",
            "price": 1499.5
        }))
        .unwrap();
        assert_eq!(product.price, dec("1499.5"));
        assert!(product.colors.is_empty());
        assert!(product.category_id.is_none());
    }

    #[test]
    fn test_clean_description_strips_quotes() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Vase",
            "description": "\"<p>Hand thrown</p>\""
        }))
        .unwrap();
        assert_eq!(product.clean_description(), "<p>Hand thrown</p>");
    }

    #[test]
    fn test_admin_list_both_shapes() {
        let admin = json!({ "_id": "a1", "email": "ops@atelier.shop", "role": "ADMIN", "isActive": true });

        let paged: AdminListData = serde_json::from_value(json!({
            "admins": [admin.clone()],
            "pagination": { "page": 2, "limit": 10, "total": 11, "pages": 2 }
        }))
        .unwrap();
        let page = AdminPage::from(paged);
        assert_eq!(page.admins.len(), 1);
        assert_eq!(page.pagination.unwrap().pages, 2);

        let plain: AdminListData = serde_json::from_value(json!([admin])).unwrap();
        let page = AdminPage::from(plain);
        assert_eq!(page.admins[0].role, AdminRole::Admin);
        assert!(page.pagination.is_none());
    }

    #[test]
    fn test_admin_filter_resets_page_on_filter_change() {
        let filter = AdminFilter::default().with_page(3);
        assert_eq!(filter.page, 3);

        let same = filter.clone().with_role(None);
        assert_eq!(same.page, 3);

        let narrowed = filter.with_role(Some(AdminRole::Product));
        assert_eq!(narrowed.page, 1);

        let searched = narrowed.with_page(2).with_search(Some("  ops ".to_string()));
        assert_eq!(searched.page, 1);
        assert_eq!(searched.search.as_deref(), Some("ops"));
    }

    #[test]
    fn test_admin_filter_query_shape() {
        let filter = AdminFilter::default().with_active(Some(false));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({ "page": 1, "limit": 10, "isActive": false })
        );
    }

    #[test]
    fn test_login_response_debug_redacts_token() {
        let login: LoginResponse = serde_json::from_value(json!({
            "token": "jwt.secret.value",
            "email": "ops@atelier.shop",
            "role": "SUPERADMIN"
        }))
        .unwrap();
        let debug_output = format!("{login:?}");
        assert!(!debug_output.contains("jwt.secret.value"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
