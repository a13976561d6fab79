//! Per-operator view state.
//!
//! Each signed-in session owns a [`Workspace`] holding the listing cache, the
//! bulk price form and the product search. Workspaces are keyed by the
//! random key stored in the session and expire after the same idle period as
//! the session cookie.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::bulk::{BulkPriceForm, ProductSearch};
use crate::listing::PagedProductCache;

/// Idle period after which an unused workspace is dropped.
pub const WORKSPACE_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_WORKSPACES: u64 = 1_000;

#[derive(Debug)]
pub struct Workspace {
    pub listing: Mutex<PagedProductCache>,
    pub bulk: Mutex<BulkPriceForm>,
    pub search: ProductSearch,
}

impl Workspace {
    #[must_use]
    pub fn new(page_size: u32, search_debounce: Duration) -> Self {
        Self {
            listing: Mutex::new(PagedProductCache::new(page_size)),
            bulk: Mutex::new(BulkPriceForm::default()),
            search: ProductSearch::new(search_debounce),
        }
    }
}

#[derive(Clone)]
pub struct WorkspaceRegistry {
    cache: Cache<Uuid, Arc<Workspace>>,
    page_size: u32,
    search_debounce: Duration,
}

impl WorkspaceRegistry {
    #[must_use]
    pub fn new(page_size: u32, search_debounce: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_WORKSPACES)
            .time_to_idle(WORKSPACE_IDLE)
            .build();

        Self {
            cache,
            page_size,
            search_debounce,
        }
    }

    /// The workspace for `key`, created on first use.
    pub async fn get_or_create(&self, key: Uuid) -> Arc<Workspace> {
        let (page_size, debounce) = (self.page_size, self.search_debounce);
        self.cache
            .get_with(key, async move { Arc::new(Workspace::new(page_size, debounce)) })
            .await
    }

    /// Drop the workspace for `key`, cancelling its pending search.
    pub async fn evict(&self, key: Uuid) {
        if let Some(workspace) = self.cache.remove(&key).await {
            workspace.search.reset().await;
            tracing::debug!(workspace = %key, "Workspace evicted");
        }
    }

    pub async fn contains(&self, key: Uuid) -> bool {
        self.cache.get(&key).await.is_some()
    }
}

impl std::fmt::Debug for WorkspaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceRegistry")
            .field("entries", &self.cache.entry_count())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
