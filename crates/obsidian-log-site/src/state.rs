//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::content::ContentLoader;
use crate::github::{GithubClient, RepoContents};
use crate::identity::{IdentityProvider, SupabaseAuth};
use crate::page_metadata::{HttpMetadataFetcher, MetadataSource};
use crate::resolver::ConfigResolver;
use crate::store::{ContentStore, PostgrestStore};
use crate::tasks::TaskBoard;

/// Shared application state available to all request handlers.
///
/// External collaborators are trait objects so tests can swap in doubles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// GitHub contents API for the mirror repository.
    pub github: Arc<dyn RepoContents>,

    /// Identity provider; `None` when sign-in isn't configured.
    pub identity: Option<Arc<dyn IdentityProvider>>,

    /// Content store; `None` when it isn't configured.
    pub store: Option<Arc<dyn ContentStore>>,

    /// Link-card metadata source (cached).
    pub metadata: Arc<dyn MetadataSource>,
}

impl AppState {
    /// Create the production state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let github = GithubClient::new(&config.github_api_url, config.github_token.clone())?;

        let (identity, store) = match &config.supabase {
            Some(supabase) => {
                let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseAuth::new(supabase)?);
                let store: Arc<dyn ContentStore> = Arc::new(PostgrestStore::new(supabase)?);
                (Some(identity), Some(store))
            }
            None => (None, None),
        };

        let metadata = HttpMetadataFetcher::new()?;

        tracing::info!(
            sign_in = identity.is_some(),
            task_store = store.is_some(),
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            github: Arc::new(github),
            identity,
            store,
            metadata: Arc::new(metadata),
        })
    }

    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(
            self.github.clone(),
            self.config.github_repo_url.clone(),
            self.config.github_token.clone(),
            self.config.content_dir.clone(),
        )
    }

    pub fn content(&self) -> ContentLoader {
        ContentLoader::new(
            self.github.clone(),
            self.config.github_repo_url.clone(),
            self.config.content_dir.clone(),
        )
    }

    pub fn tasks(&self) -> Option<TaskBoard<'_>> {
        self.store.as_deref().map(TaskBoard::new)
    }
}
