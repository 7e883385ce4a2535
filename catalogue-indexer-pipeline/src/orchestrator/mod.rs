//! Orchestrator module for the reindex pipeline.
//!
//! Coordinates the normalizer, schema manager, and loader components.

use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::cancellation::CancellationSignal;
use crate::config::ReindexConfig;
use crate::errors::PipelineError;
use crate::loader::BulkLoader;
use crate::processor::Normalizer;
use crate::schema_manager::SchemaManager;
use catalogue_indexer_repository::{IndexSchema, SchemaError, SearchEngineClient};
use catalogue_indexer_shared::{BulkResult, CatalogueRecord, Completion};

/// Outcome of a reindex run that got as far as loading documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ReindexReport {
    pub index_name: String,
    /// Number of documents produced from the catalogue.
    pub documents: usize,
    pub result: BulkResult,
    /// Documents the engine holds after the load, if it could be counted.
    pub indexed_count: Option<u64>,
}

impl fmt::Display for ReindexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} rebuilt, {} of {} documents indexed, failures: [",
            self.index_name,
            self.result.succeeded(),
            self.documents
        )?;
        for (i, failure) in self.result.failures().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", failure)?;
        }
        write!(f, "]")?;
        if self.result.completion() == Completion::Cancelled {
            write!(f, " (cancelled after {} submitted)", self.result.submitted())?;
        }
        Ok(())
    }
}

/// Runs a full reindex: normalize the catalogue, rebuild the index, load it.
///
/// Callers must not run two reindexes against the same index at once.
pub struct Reindexer {
    client: Arc<dyn SearchEngineClient>,
    normalizer: Normalizer,
    schema_manager: SchemaManager,
    loader: BulkLoader,
    config: ReindexConfig,
}

impl Reindexer {
    /// Create a reindexer for the given client and configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>, config: ReindexConfig) -> Self {
        Self {
            normalizer: Normalizer::with_config(config.normalizer.clone()),
            schema_manager: SchemaManager::new(client.clone()),
            loader: BulkLoader::with_config(client.clone(), config.loader.clone()),
            client,
            config,
        }
    }

    pub fn config(&self) -> &ReindexConfig {
        &self.config
    }

    /// Rebuild the index from `records`.
    ///
    /// Normalization runs on a blocking task while the schema is checked.
    /// The index is only deleted once both have succeeded, so an invalid
    /// record or schema leaves the existing index untouched. Raising
    /// `cancel` before that point also leaves it untouched; raising it later
    /// stops the load from issuing further batches.
    #[instrument(skip(self, records, cancel), fields(index = %self.config.index_name, record_count = records.len()))]
    pub async fn run(
        &self,
        records: Vec<CatalogueRecord>,
        cancel: &CancellationSignal,
    ) -> Result<ReindexReport, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        info!("Starting catalogue reindex");

        let schema = self.config.schema_for(records.len());
        let normalizer = self.normalizer.clone();
        let normalize = tokio::task::spawn_blocking(move || normalizer.normalize(&records));

        let (documents, prepared) = tokio::join!(normalize, self.prepare(&schema));
        let documents = documents.map_err(|e| PipelineError::TaskError(e.to_string()))??;
        prepared?;

        if cancel.is_cancelled() {
            info!("Cancelled before the index was rebuilt");
            return Err(PipelineError::Cancelled);
        }

        self.schema_manager.recreate(&schema).await?;

        let result = self
            .loader
            .bulk_load(schema.name(), &documents, cancel)
            .await?;

        let indexed_count = self.indexed_count(schema.name()).await;

        let report = ReindexReport {
            index_name: schema.name().to_string(),
            documents: documents.len(),
            result,
            indexed_count,
        };
        info!(
            submitted = report.result.submitted(),
            failed = report.result.failed(),
            indexed = ?report.indexed_count,
            "Catalogue reindex finished"
        );
        Ok(report)
    }

    /// The checks that run alongside normalization. None of them touch the index.
    async fn prepare(&self, schema: &IndexSchema) -> Result<(), SchemaError> {
        self.schema_manager.validate(schema)?;

        match self.client.health_check().await {
            Ok(true) => {}
            Ok(false) => warn!("Search engine reports an unhealthy cluster"),
            Err(e) => warn!(error = %e, "Search engine health check failed"),
        }
        Ok(())
    }

    /// Make the load visible and count what landed in the index.
    async fn indexed_count(&self, index: &str) -> Option<u64> {
        if let Err(e) = self.client.refresh_index(index).await {
            warn!(error = %e, "Failed to refresh index after load");
            return None;
        }
        match self.client.count_documents(index).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to count indexed documents");
                None
            }
        }
    }
}
