//! Banner, portfolio, testimonial, wishlist and media asset endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use atelier_core::{BannerId, PortfolioId, TestimonialId};

use super::{
    Ack, ApiError, ApiSession, AssetRemoval, Banner, BannerInput, Portfolio, StoryInput,
    Testimonial, WishlistEntry,
};

#[derive(Serialize)]
struct PageOnly {
    page: u32,
}

#[derive(Serialize)]
struct ByEmail<'a> {
    email: &'a str,
}

impl ApiSession {
    // -------------------------------------------------------------------------
    // Banners
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.get(&["banners"]).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_banner(&self, input: &BannerInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["banners"], Some(input)).await
    }

    #[instrument(skip(self), fields(banner_id = %id))]
    pub async fn delete_banner(&self, id: &BannerId) -> Result<Ack, ApiError> {
        self.send::<()>(Method::DELETE, &["banners", id.as_str()], None)
            .await
    }

    // -------------------------------------------------------------------------
    // Portfolios
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn portfolios(&self) -> Result<Vec<Portfolio>, ApiError> {
        self.get(&["portfolios"]).await
    }

    #[instrument(skip(self), fields(portfolio_id = %id))]
    pub async fn portfolio(&self, id: &PortfolioId) -> Result<Portfolio, ApiError> {
        self.get(&["portfolios", id.as_str()]).await
    }

    #[instrument(skip(self, input), fields(portfolio_id = ?input.id))]
    pub async fn save_portfolio(&self, input: &StoryInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["portfolios"], Some(input)).await
    }

    #[instrument(skip(self), fields(portfolio_id = %id))]
    pub async fn delete_portfolio(&self, id: &PortfolioId) -> Result<Ack, ApiError> {
        self.send::<()>(Method::DELETE, &["portfolios", id.as_str()], None)
            .await
    }

    // -------------------------------------------------------------------------
    // Testimonials
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn testimonials(&self) -> Result<Vec<Testimonial>, ApiError> {
        self.get(&["testimonials"]).await
    }

    #[instrument(skip(self), fields(testimonial_id = %id))]
    pub async fn testimonial(&self, id: &TestimonialId) -> Result<Testimonial, ApiError> {
        self.get(&["testimonials", id.as_str()]).await
    }

    #[instrument(skip(self, input), fields(testimonial_id = ?input.id))]
    pub async fn save_testimonial(&self, input: &StoryInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["testimonials"], Some(input)).await
    }

    // -------------------------------------------------------------------------
    // Wishlists
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn wishlists(&self, page: u32) -> Result<Vec<WishlistEntry>, ApiError> {
        self.get_with(&["wishlists"], &PageOnly { page }).await
    }

    /// Wishlist entries for one storefront customer.
    #[instrument(skip(self))]
    pub async fn wishlists_by_user(
        &self,
        email: &str,
        page: u32,
    ) -> Result<Vec<WishlistEntry>, ApiError> {
        let response = self
            .request(Method::POST, &["wishlistByUser"])
            .query(&PageOnly { page })
            .json(&ByEmail { email })
            .send()
            .await?;
        super::handle_response::<Vec<WishlistEntry>>(response)
            .await?
            .into_data()
    }

    // -------------------------------------------------------------------------
    // Media assets
    // -------------------------------------------------------------------------

    /// Remove images from the media host.
    #[instrument(skip(self), fields(count = public_ids.len()))]
    pub async fn remove_assets(&self, public_ids: &[String]) -> Result<Ack, ApiError> {
        if public_ids.is_empty() {
            return Ok(Ack::default());
        }
        self.send(
            Method::DELETE,
            &["asset"],
            Some(&AssetRemoval { public_ids }),
        )
        .await
    }
}
