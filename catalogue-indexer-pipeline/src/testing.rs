//! In-memory search engine used by the pipeline tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::cancellation::CancellationSignal;
use catalogue_indexer_repository::{
    BulkItem, BulkResponse, CreateIndexResponse, IndexSchema, SearchEngineClient, SearchError,
};
use catalogue_indexer_shared::IndexDocument;

struct StoredIndex {
    schema: IndexSchema,
    documents: BTreeMap<String, Map<String, Value>>,
}

/// Fake engine keeping indices in memory, with knobs to inject failures.
pub(crate) struct InMemoryEngine {
    indices: Mutex<HashMap<String, StoredIndex>>,
    calls: Mutex<Vec<String>>,
    bulk_calls: AtomicUsize,
    bulk_in_flight: AtomicUsize,
    max_bulk_in_flight: AtomicUsize,
    rejected: HashSet<String>,
    bulk_failures: HashMap<usize, SearchError>,
    bulk_failures_from: Option<(usize, SearchError)>,
    applied_bulk_failures: HashMap<usize, SearchError>,
    bulk_delays: HashMap<usize, Duration>,
    cancel_after_bulk_call: Option<(usize, CancellationSignal)>,
    truncate_responses: bool,
    delete_error: Option<SearchError>,
    create_error: Option<SearchError>,
    acknowledge_create: bool,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            indices: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            bulk_calls: AtomicUsize::new(0),
            bulk_in_flight: AtomicUsize::new(0),
            max_bulk_in_flight: AtomicUsize::new(0),
            rejected: HashSet::new(),
            bulk_failures: HashMap::new(),
            bulk_failures_from: None,
            applied_bulk_failures: HashMap::new(),
            bulk_delays: HashMap::new(),
            cancel_after_bulk_call: None,
            truncate_responses: false,
            delete_error: None,
            create_error: None,
            acknowledge_create: true,
        }
    }

    /// Reject the document with this id with a mapping error.
    pub fn rejecting(mut self, id: &str) -> Self {
        self.rejected.insert(id.to_string());
        self
    }

    /// Fail the given (1-based) bulk call.
    pub fn failing_bulk_call(mut self, call: usize, error: SearchError) -> Self {
        self.bulk_failures.insert(call, error);
        self
    }

    /// Fail every bulk call from the given (1-based) one onwards.
    pub fn failing_bulk_calls_from(mut self, call: usize, error: SearchError) -> Self {
        self.bulk_failures_from = Some((call, error));
        self
    }

    /// Apply the given (1-based) bulk call, then fail it as if the response
    /// was lost.
    pub fn applying_then_failing_bulk_call(mut self, call: usize, error: SearchError) -> Self {
        self.applied_bulk_failures.insert(call, error);
        self
    }

    /// Apply the given (1-based) bulk call, then wait before responding.
    pub fn delaying_bulk_call(mut self, call: usize, delay: Duration) -> Self {
        self.bulk_delays.insert(call, delay);
        self
    }

    /// Raise `signal` once the given (1-based) bulk call has completed.
    pub fn cancelling_after_bulk_call(mut self, call: usize, signal: CancellationSignal) -> Self {
        self.cancel_after_bulk_call = Some((call, signal));
        self
    }

    /// Drop the last item of every bulk response.
    pub fn truncating_responses(mut self) -> Self {
        self.truncate_responses = true;
        self
    }

    pub fn failing_delete(mut self, error: SearchError) -> Self {
        self.delete_error = Some(error);
        self
    }

    pub fn failing_create(mut self, error: SearchError) -> Self {
        self.create_error = Some(error);
        self
    }

    pub fn unacknowledged_create(mut self) -> Self {
        self.acknowledge_create = false;
        self
    }

    /// Create an index holding the given documents, bypassing the call log.
    pub async fn seed(&self, schema: &IndexSchema, documents: &[IndexDocument]) {
        let documents = documents
            .iter()
            .map(|doc| (doc.id().to_string(), doc.body().clone()))
            .collect();
        self.indices.lock().await.insert(
            schema.name().to_string(),
            StoredIndex {
                schema: schema.clone(),
                documents,
            },
        );
    }

    pub async fn document_ids(&self, index: &str) -> Option<Vec<String>> {
        self.indices
            .lock()
            .await
            .get(index)
            .map(|stored| stored.documents.keys().cloned().collect())
    }

    pub async fn schema(&self, index: &str) -> Option<IndexSchema> {
        self.indices
            .lock()
            .await
            .get(index)
            .map(|stored| stored.schema.clone())
    }

    /// Names of the index management and bulk calls made, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub fn bulk_call_count(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    /// Highest number of bulk requests observed in flight at once.
    pub fn max_bulk_in_flight(&self) -> usize {
        self.max_bulk_in_flight.load(Ordering::SeqCst)
    }

    fn bulk_failure(&self, call: usize) -> Option<SearchError> {
        if let Some(error) = self.bulk_failures.get(&call) {
            return Some(error.clone());
        }
        match &self.bulk_failures_from {
            Some((from, error)) if call >= *from => Some(error.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl SearchEngineClient for InMemoryEngine {
    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        self.calls.lock().await.push("delete".to_string());
        if let Some(error) = &self.delete_error {
            return Err(error.clone());
        }
        match self.indices.lock().await.remove(index) {
            Some(_) => Ok(()),
            None => Err(SearchError::index_not_found(index)),
        }
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<CreateIndexResponse, SearchError> {
        self.calls.lock().await.push("create".to_string());
        if let Some(error) = &self.create_error {
            return Err(error.clone());
        }

        let mut indices = self.indices.lock().await;
        if indices.contains_key(schema.name()) {
            return Err(SearchError::index_creation(format!(
                "resource_already_exists_exception: index [{}] already exists",
                schema.name()
            )));
        }
        indices.insert(
            schema.name().to_string(),
            StoredIndex {
                schema: schema.clone(),
                documents: BTreeMap::new(),
            },
        );

        Ok(CreateIndexResponse {
            acknowledged: self.acknowledge_create,
            shards_acknowledged: self.acknowledge_create,
        })
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkResponse, SearchError> {
        let call = self.bulk_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().await.push("bulk".to_string());

        let in_flight = self.bulk_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_bulk_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        // Let other in-flight batches interleave with this one.
        tokio::task::yield_now().await;
        self.bulk_in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.bulk_failure(call) {
            return Err(error);
        }

        let mut indices = self.indices.lock().await;
        let stored = indices
            .get_mut(index)
            .ok_or_else(|| SearchError::index_not_found(index))?;

        let mut items: Vec<BulkItem> = documents
            .iter()
            .map(|doc| {
                if self.rejected.contains(doc.id()) {
                    return BulkItem::rejected(
                        doc.id(),
                        400,
                        "mapper_parsing_exception: failed to parse field [moduleCredit]",
                    );
                }
                match stored.documents.insert(doc.id().to_string(), doc.body().clone()) {
                    None => BulkItem::created(doc.id()),
                    Some(_) => BulkItem {
                        id: Some(doc.id().to_string()),
                        status: 200,
                        error: None,
                    },
                }
            })
            .collect();

        if self.truncate_responses {
            items.pop();
        }
        drop(indices);

        if let Some(delay) = self.bulk_delays.get(&call) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.applied_bulk_failures.get(&call) {
            return Err(error.clone());
        }

        if let Some((after, signal)) = &self.cancel_after_bulk_call {
            if call == *after {
                signal.cancel();
            }
        }

        Ok(BulkResponse {
            took: 1,
            errors: items.iter().any(|item| !item.is_created()),
            items,
        })
    }

    async fn refresh_index(&self, index: &str) -> Result<(), SearchError> {
        if self.indices.lock().await.contains_key(index) {
            Ok(())
        } else {
            Err(SearchError::index_not_found(index))
        }
    }

    async fn count_documents(&self, index: &str) -> Result<u64, SearchError> {
        self.indices
            .lock()
            .await
            .get(index)
            .map(|stored| stored.documents.len() as u64)
            .ok_or_else(|| SearchError::index_not_found(index))
    }

    async fn analyze(
        &self,
        index: &str,
        analyzer: &str,
        text: &str,
    ) -> Result<Vec<String>, SearchError> {
        let indices = self.indices.lock().await;
        let stored = indices
            .get(index)
            .ok_or_else(|| SearchError::index_not_found(index))?;
        stored
            .schema
            .analysis()
            .analyze(analyzer, text)
            .map_err(|e| SearchError::query(e.to_string()))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

/// Documents `prefix0..prefix{count}` with a module code body.
pub(crate) fn documents(prefix: &str, count: usize) -> Vec<IndexDocument> {
    (0..count)
        .map(|i| {
            let id = format!("{}{:04}", prefix, i);
            let mut body = Map::new();
            body.insert("moduleCode".to_string(), Value::String(id.clone()));
            IndexDocument::new(id, body)
        })
        .collect()
}
