//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError, ApiSession};
use crate::config::ConsoleConfig;
use crate::media::ImageResolver;
use crate::models::ConsoleSession;
use crate::workspace::{Workspace, WorkspaceRegistry};

/// Application state shared across all handlers.
///
/// Cloning is cheap; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    api: ApiClient,
    media: ImageResolver,
    workspaces: WorkspaceRegistry,
}

impl AppState {
    /// Build the state, creating the REST client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: ConsoleConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api_url.clone(), config.api_timeout)?;
        let media = ImageResolver::new(&config.media_cloud);
        let workspaces = WorkspaceRegistry::new(config.page_size, config.search_debounce);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                media,
                workspaces,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// API handle authenticated as `operator`.
    #[must_use]
    pub fn api_for(&self, operator: &ConsoleSession) -> ApiSession {
        self.inner.api.session(Some(&operator.token))
    }

    #[must_use]
    pub fn media(&self) -> &ImageResolver {
        &self.inner.media
    }

    #[must_use]
    pub fn workspaces(&self) -> &WorkspaceRegistry {
        &self.inner.workspaces
    }

    /// The operator's workspace.
    pub async fn workspace(&self, operator: &ConsoleSession) -> Arc<Workspace> {
        self.inner.workspaces.get_or_create(operator.workspace).await
    }
}
