//! Schema manager for the reindex pipeline.
//!
//! Rebuilds the target index from scratch so its schema always matches the
//! declared one exactly. Recreating on every run avoids having to diff and
//! migrate schemas; the catalogue is small enough for a full rebuild.
//!
//! Two runs against the same index name must not overlap: the delete and
//! create steps of one run would race with the other's. Callers serialize
//! runs per index.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use catalogue_indexer_repository::{IndexSchema, SchemaError, SearchEngineClient, SearchError};

/// Ensures an index exists with exactly a given schema.
pub struct SchemaManager {
    client: Arc<dyn SearchEngineClient>,
}

impl SchemaManager {
    /// Create a new schema manager with the given client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }

    /// Check the schema's internal references without touching the engine.
    pub fn validate(&self, schema: &IndexSchema) -> Result<(), SchemaError> {
        schema.validate()
    }

    /// Delete any existing index with the schema's name, then create it from
    /// the schema in one request.
    ///
    /// A missing index is not an error, so calling this repeatedly always
    /// ends with a fresh, empty index. Any other deletion failure aborts
    /// before creation.
    #[instrument(skip(self, schema), fields(index = %schema.name()))]
    pub async fn ensure_schema(&self, schema: &IndexSchema) -> Result<(), SchemaError> {
        self.validate(schema)?;
        self.recreate(schema).await
    }

    /// Delete and create, assuming the schema has already been validated.
    pub(crate) async fn recreate(&self, schema: &IndexSchema) -> Result<(), SchemaError> {
        let index = schema.name();

        self.delete_existing(index).await?;

        let created = self.client.create_index(schema).await.map_err(|e| {
            error!(index = %index, error = %e, "Failed to create index");
            SchemaError::create(index, e)
        })?;

        if !created.acknowledged {
            error!(index = %index, "Index creation was not acknowledged");
            // Leave nothing behind for the loader to write into.
            match self.client.delete_index(index).await {
                Ok(()) | Err(SearchError::IndexNotFound(_)) => {}
                Err(e) => {
                    warn!(index = %index, error = %e, "Failed to remove unacknowledged index")
                }
            }
            return Err(SchemaError::NotAcknowledged(index.to_string()));
        }

        if !created.shards_acknowledged {
            warn!(index = %index, "Index created before all shard copies started");
        }

        info!(index = %index, "Index schema rebuilt");
        Ok(())
    }

    async fn delete_existing(&self, index: &str) -> Result<(), SchemaError> {
        match self.client.delete_index(index).await {
            Ok(()) => {
                info!(index = %index, "Deleted previous index");
                Ok(())
            }
            Err(SearchError::IndexNotFound(_)) => {
                debug!(index = %index, "No previous index to delete");
                Ok(())
            }
            Err(e) => {
                error!(index = %index, error = %e, "Failed to delete previous index");
                Err(SchemaError::delete(index, e))
            }
        }
    }
}
