//! Debounced product search for the bulk price form.

use std::time::Duration;

use tokio::sync::Mutex;

use crate::api::{ApiError, CatalogApi, Product};
use crate::debounce::Debouncer;

/// What a search keystroke produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results for the latest text.
    Results(Vec<Product>),
    /// The text was empty; results were cleared without a request.
    Cleared,
    /// Newer input arrived; this keystroke's work was dropped.
    Superseded,
}

#[derive(Debug)]
pub struct ProductSearch {
    debouncer: Debouncer,
    results: Mutex<Vec<Product>>,
}

impl ProductSearch {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Handle one keystroke's worth of search text.
    ///
    /// Waits out the quiet period; only the text still current afterwards is
    /// sent. A response that returns after newer input is discarded.
    ///
    /// # Errors
    ///
    /// Returns the API error if the search request fails.
    pub async fn query<A>(&self, api: &A, text: &str) -> Result<SearchOutcome, ApiError>
    where
        A: CatalogApi + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            self.reset().await;
            return Ok(SearchOutcome::Cleared);
        }

        let Some(ticket) = self.debouncer.settle().await else {
            return Ok(SearchOutcome::Superseded);
        };

        let hits = api.search_products(text).await?;
        if !self.debouncer.is_current(ticket) {
            tracing::debug!(query = text, "Dropping stale search response");
            return Ok(SearchOutcome::Superseded);
        }

        (*self.results.lock().await).clone_from(&hits);
        Ok(SearchOutcome::Results(hits))
    }

    /// Results of the last completed search.
    pub async fn results(&self) -> Vec<Product> {
        self.results.lock().await.clone()
    }

    /// Cancel pending searches and clear results.
    pub async fn reset(&self) {
        self.debouncer.cancel();
        self.results.lock().await.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use atelier_core::{CategoryId, ProductId};

    use super::*;
    use crate::api::{Ack, BulkPriceUpdate, Category, ProductPage};

    #[derive(Default)]
    struct RecordingCatalog {
        queries: StdMutex<Vec<String>>,
        latency: Duration,
    }

    fn product(name: &str) -> Product {
        serde_json::from_value(serde_json::json!({ "_id": name, "name": name })).unwrap()
    }

    #[async_trait]
    impl CatalogApi for RecordingCatalog {
        async fn categories(&self) -> Result<Vec<Category>, ApiError> {
            Ok(vec![])
        }

        async fn products_page(
            &self,
            _category: &CategoryId,
            _page: u32,
            _limit: u32,
        ) -> Result<ProductPage, ApiError> {
            Err(ApiError::NotFound)
        }

        async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
            self.queries.lock().unwrap().push(query.to_string());
            tokio::time::sleep(self.latency).await;
            Ok(vec![product(&format!("{query}-hit"))])
        }

        async fn bulk_update(&self, _update: &BulkPriceUpdate) -> Result<Ack, ApiError> {
            Ok(Ack::default())
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_sends_one_search() {
        let search = ProductSearch::new(DELAY);
        let api = RecordingCatalog::default();

        let (s, so, sof) = tokio::join!(
            search.query(&api, "s"),
            async {
                tokio::time::sleep(Duration::from_millis(120)).await;
                search.query(&api, "so").await
            },
            async {
                tokio::time::sleep(Duration::from_millis(240)).await;
                search.query(&api, "sof").await
            },
        );

        assert_eq!(s.unwrap(), SearchOutcome::Superseded);
        assert_eq!(so.unwrap(), SearchOutcome::Superseded);
        assert!(matches!(sof.unwrap(), SearchOutcome::Results(ref hits) if hits.len() == 1));
        assert_eq!(*api.queries.lock().unwrap(), vec!["sof".to_string()]);
        assert_eq!(search.results().await[0].id, ProductId::new("sof-hit"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_clears_without_request() {
        let search = ProductSearch::new(DELAY);
        let api = RecordingCatalog::default();

        search.query(&api, "lamp").await.unwrap();
        assert_eq!(search.results().await.len(), 1);

        assert_eq!(
            search.query(&api, "   ").await.unwrap(),
            SearchOutcome::Cleared
        );
        assert!(search.results().await.is_empty());
        assert_eq!(api.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_cancels_pending_search() {
        let search = ProductSearch::new(DELAY);
        let api = RecordingCatalog::default();

        let (pending, cleared) = tokio::join!(search.query(&api, "rug"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search.query(&api, "").await
        });

        assert_eq!(pending.unwrap(), SearchOutcome::Superseded);
        assert_eq!(cleared.unwrap(), SearchOutcome::Cleared);
        assert!(api.queries.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_dropped_after_newer_input() {
        let search = ProductSearch::new(DELAY);
        let api = RecordingCatalog {
            latency: Duration::from_millis(300),
            ..RecordingCatalog::default()
        };

        // "a" settles at 500ms and its response lands at 800ms, after "ab"
        // was typed at 600ms.
        let (first, second) = tokio::join!(search.query(&api, "a"), async {
            tokio::time::sleep(Duration::from_millis(600)).await;
            search.query(&api, "ab").await
        });

        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        assert_eq!(
            second.unwrap(),
            SearchOutcome::Results(vec![product("ab-hit")])
        );
        assert_eq!(
            *api.queries.lock().unwrap(),
            vec!["a".to_string(), "ab".to_string()]
        );
        assert_eq!(search.results().await, vec![product("ab-hit")]);
    }
}
