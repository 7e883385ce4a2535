//! Search engine client trait definition.
//!
//! This module defines the abstract interface for the index management and
//! bulk ingest operations a reindex needs, allowing for different backend
//! implementations (OpenSearch, Elasticsearch, in-memory fakes, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::schema::IndexSchema;
use crate::types::{BulkResponse, CreateIndexResponse};
use catalogue_indexer_shared::IndexDocument;

/// Abstract interface for search engine operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>` for consistent error handling.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Delete an index and every document in it.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was deleted
    /// * `Err(SearchError::IndexNotFound)` - If no index with that name exists
    /// * `Err(SearchError)` - If the deletion fails for any other reason
    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    /// Create an index with the settings, analysis and mappings of `schema`
    /// in a single request.
    ///
    /// # Returns
    ///
    /// * `Ok(CreateIndexResponse)` - The engine answered; check `acknowledged`
    /// * `Err(SearchError)` - If the engine rejected the request
    async fn create_index(&self, schema: &IndexSchema) -> Result<CreateIndexResponse, SearchError>;

    /// Submit one bulk request with an `index` action per document.
    ///
    /// The document id is used as the `_id`. Items in the response are in the
    /// same order as `documents`.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkResponse)` - The per-item outcomes, including rejected items
    /// * `Err(SearchError)` - If the request as a whole failed
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkResponse, SearchError>;

    /// Make every indexed document visible to search and count requests.
    async fn refresh_index(&self, index: &str) -> Result<(), SearchError>;

    /// Count the documents in an index.
    async fn count_documents(&self, index: &str) -> Result<u64, SearchError>;

    /// Run `text` through an analyzer of an existing index and return the
    /// produced tokens.
    async fn analyze(&self, index: &str, analyzer: &str, text: &str)
        -> Result<Vec<String>, SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
