//! Paged product cache for the category screen.
//!
//! Pages are cached per category and page number until something in the
//! category changes. Invalidation is explicit: handlers that create, update
//! or delete a product call [`PagedProductCache::reset`].
//!
//! The cache never holds its lock across a fetch. A fetch records the cache
//! generation it started under, and its result is only stored if no reset
//! happened in between.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use atelier_core::CategoryId;

use crate::api::{ApiError, CatalogApi, ProductPage};

/// A cache miss: everything needed to fetch the page and store it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    pub category: CategoryId,
    pub page: u32,
    pub limit: u32,
    generation: u64,
}

/// Result of looking a page up.
#[derive(Debug)]
pub enum Lookup {
    Hit { page: u32, hit: Arc<ProductPage> },
    Miss(PageFetch),
}

#[derive(Debug)]
pub struct PagedProductCache {
    category: Option<CategoryId>,
    page_size: u32,
    generation: u64,
    pages: HashMap<u32, Arc<ProductPage>>,
    total_pages: Option<u32>,
}

impl PagedProductCache {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            category: None,
            page_size: page_size.max(1),
            generation: 0,
            pages: HashMap::new(),
            total_pages: None,
        }
    }

    /// Category the cached pages belong to.
    #[must_use]
    pub const fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total page count from the last successful fetch.
    #[must_use]
    pub const fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Point the cache at `category`, dropping pages of any other category.
    ///
    /// Returns whether the category changed.
    pub fn focus(&mut self, category: &CategoryId) -> bool {
        if self.category.as_ref() == Some(category) {
            return false;
        }
        self.reset();
        self.category = Some(category.clone());
        true
    }

    /// Drop every cached page and the page count.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.total_pages = None;
        self.generation += 1;
    }

    /// Change the page size. Cached pages are laid out for the old size, so
    /// they are dropped.
    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.reset();
        }
    }

    /// Clamp a requested page into the known range. Page 0 means page 1.
    #[must_use]
    pub fn clamp(&self, page: u32) -> u32 {
        let page = page.max(1);
        match self.total_pages {
            Some(total) if total > 0 => page.min(total),
            _ => page,
        }
    }

    #[must_use]
    pub fn cached(&self, page: u32) -> Option<Arc<ProductPage>> {
        self.pages.get(&page).cloned()
    }

    /// Look up a page of `category`, focusing the cache on it first.
    pub fn lookup(&mut self, category: &CategoryId, page: u32) -> Lookup {
        self.focus(category);
        let page = self.clamp(page);

        match self.cached(page) {
            Some(hit) => Lookup::Hit { page, hit },
            None => Lookup::Miss(PageFetch {
                category: category.clone(),
                page,
                limit: self.page_size,
                generation: self.generation,
            }),
        }
    }

    /// Store a fetched page and hand it back.
    ///
    /// A page fetched before the last reset is returned but not stored.
    pub fn complete(&mut self, fetch: &PageFetch, page: ProductPage) -> Arc<ProductPage> {
        let page = Arc::new(page);
        let still_valid = fetch.generation == self.generation
            && self.category.as_ref() == Some(&fetch.category);

        if still_valid {
            self.total_pages = Some(page.pages.max(1));
            self.pages.insert(fetch.page, Arc::clone(&page));
        } else {
            tracing::debug!(
                category_id = %fetch.category,
                page = fetch.page,
                "Discarding product page fetched before a reset"
            );
        }

        page
    }
}

/// A page of `category`, from the cache or the API.
///
/// Returns the page number actually shown (after clamping) with the page.
///
/// # Errors
///
/// Returns the API error when the page is not cached and the fetch fails;
/// nothing is cached in that case, so the page stays retryable.
pub async fn ensure_page<A>(
    cache: &Mutex<PagedProductCache>,
    api: &A,
    category: &CategoryId,
    page: u32,
) -> Result<(u32, Arc<ProductPage>), ApiError>
where
    A: CatalogApi + ?Sized,
{
    let fetch = match cache.lock().await.lookup(category, page) {
        Lookup::Hit { page, hit } => return Ok((page, hit)),
        Lookup::Miss(fetch) => fetch,
    };

    let fetched = api
        .products_page(&fetch.category, fetch.page, fetch.limit)
        .await?;

    let stored = cache.lock().await.complete(&fetch, fetched);
    Ok((fetch.page, stored))
}
