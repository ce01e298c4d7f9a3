//! Application state shared across all request handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::engines::EngineStore;
use crate::opensearch::{DiscoveryCache, HttpFetcher, OpenSearchDiscoverer};

/// Shared application state.
pub struct AppState {
    /// Engine store; handlers take a read snapshot per request.
    pub registry: RwLock<EngineStore>,
    /// OpenSearch discoverer.
    pub discoverer: OpenSearchDiscoverer<HttpFetcher>,
    /// Cache of successful discoveries.
    pub discovery_cache: DiscoveryCache,
}

impl AppState {
    /// Create the state from configuration, loading the engine store.
    ///
    /// # Errors
    /// Returns an error if the store cannot be loaded or the HTTP client
    /// cannot be created.
    pub fn new(config: &AppConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let store = EngineStore::load(&config.registry_path)
            .map_err(|e| format!("Failed to load engine store: {e}"))?;
        tracing::info!(
            path = %config.registry_path.display(),
            engines = store.engines().count(),
            "engine store ready"
        );
        Self::with_store(store, config)
    }

    /// Create the state around an already loaded store.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_store(
        store: EngineStore,
        config: &AppConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let fetcher = HttpFetcher::new(&config.discovery)
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Arc::new(Self {
            registry: RwLock::new(store),
            discoverer: OpenSearchDiscoverer::new(fetcher),
            discovery_cache: DiscoveryCache::new(config.discovery.cache.clone()),
        }))
    }
}
