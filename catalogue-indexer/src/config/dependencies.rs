//! Dependency initialization and wiring for the catalogue indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::IndexingError;
use catalogue_indexer_pipeline::Reindexer;
use catalogue_indexer_repository::{OpenSearchClient, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Client for the configured OpenSearch cluster.
    pub client: Arc<dyn SearchEngineClient>,
    /// The configured reindexer ready to run.
    pub reindexer: Reindexer,
}

impl Dependencies {
    /// Connect to OpenSearch and build the reindexer from `settings`.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the settings are invalid or the cluster
    ///   cannot be reached
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        let config = settings.reindex_config()?;

        info!(
            opensearch_url = %settings.opensearch_url,
            index_name = %config.index_name,
            batch_size = config.loader.batch_size,
            max_in_flight = config.loader.max_in_flight,
            "Initializing dependencies"
        );

        let client = OpenSearchClient::new(&settings.opensearch_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let client: Arc<dyn SearchEngineClient> = Arc::new(client);
        let reindexer = Reindexer::new(client.clone(), config);

        Ok(Self { client, reindexer })
    }
}
