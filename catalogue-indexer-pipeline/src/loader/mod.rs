//! Loader module for the reindex pipeline.
//!
//! Streams normalized documents into the search index in batches.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::cancellation::CancellationSignal;
use crate::errors::TransportError;
use catalogue_indexer_repository::{BulkResponse, SearchEngineClient, SearchError};
use catalogue_indexer_shared::{BulkResult, Completion, DocumentFailure, IndexDocument};

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents per bulk request.
    pub batch_size: usize,
    /// Maximum number of bulk requests in flight at once.
    pub max_in_flight: usize,
    /// Maximum number of retry attempts for a failed bulk request.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_in_flight: 2,
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

/// Outcome of one bulk request.
#[derive(Debug, Default)]
struct BatchOutcome {
    submitted: usize,
    failures: Vec<DocumentFailure>,
}

/// Loader that bulk-indexes documents into the search engine.
///
/// The loader:
/// - Splits the documents into batches of `batch_size`
/// - Keeps up to `max_in_flight` batches in flight
/// - Retries transient transport errors with exponential backoff
/// - Records every document the engine rejects without stopping
pub struct BulkLoader {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
}

impl BulkLoader {
    /// Create a new bulk loader with the given client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new bulk loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Load every document into `index`.
    ///
    /// Rejected documents end up in the returned [`BulkResult`]. A transport
    /// error that survives retries stops submission and is returned together
    /// with the result of the batches that completed. Raising `cancel` stops
    /// new batches from being issued; batches already in flight still finish.
    #[instrument(skip(self, documents, cancel), fields(document_count = documents.len()))]
    pub async fn bulk_load(
        &self,
        index: &str,
        documents: &[IndexDocument],
        cancel: &CancellationSignal,
    ) -> Result<BulkResult, TransportError> {
        let mut batches = documents.chunks(self.config.batch_size.max(1)).peekable();
        let max_in_flight = self.config.max_in_flight.max(1);
        let mut in_flight = FuturesUnordered::new();

        let mut submitted = 0;
        let mut failures = Vec::new();
        let mut completion = Completion::Complete;
        let mut transport_error: Option<SearchError> = None;

        loop {
            while completion == Completion::Complete && in_flight.len() < max_in_flight {
                if batches.peek().is_none() {
                    break;
                }
                if cancel.is_cancelled() {
                    info!("Cancellation requested, no further batches will be issued");
                    completion = Completion::Cancelled;
                    break;
                }
                if let Some(batch) = batches.next() {
                    in_flight.push(self.submit_batch(index, batch));
                }
            }

            // A transport error stops new batches; those already in flight
            // are still drained and counted.
            match in_flight.next().await {
                Some(Ok(outcome)) => {
                    submitted += outcome.submitted;
                    failures.extend(outcome.failures);
                }
                Some(Err(source)) => {
                    warn!(
                        error = %source,
                        in_flight = in_flight.len(),
                        "Bulk request failed, no further batches will be issued"
                    );
                    completion = Completion::Aborted;
                    transport_error.get_or_insert(source);
                }
                None => break,
            }
        }

        let result = BulkResult::new(submitted, failures, completion);
        report(&result);

        match transport_error {
            Some(source) => {
                warn!(
                    error = %source,
                    submitted = result.submitted(),
                    "Bulk load aborted"
                );
                Err(TransportError {
                    source,
                    partial: result,
                })
            }
            None => Ok(result),
        }
    }

    /// Send one batch and match the response items to the documents by position.
    async fn submit_batch(
        &self,
        index: &str,
        batch: &[IndexDocument],
    ) -> Result<BatchOutcome, SearchError> {
        let (response, retried) = self.bulk_index_with_retry(index, batch).await?;

        if response.items.len() != batch.len() {
            return Err(SearchError::parse(format!(
                "Bulk response has {} items for {} documents",
                response.items.len(),
                batch.len()
            )));
        }

        let failures: Vec<DocumentFailure> = batch
            .iter()
            .zip(response.items)
            .filter(|(_, item)| !(item.is_created() || (retried && item.status == OVERWRITTEN)))
            .map(|(doc, item)| DocumentFailure {
                document_id: doc.id().to_string(),
                status: item.status,
                error: item.error.unwrap_or_else(|| describe_status(item.status)),
            })
            .collect();

        debug!(
            count = batch.len(),
            failed = failures.len(),
            took_ms = response.took,
            "Bulk request completed"
        );

        Ok(BatchOutcome {
            submitted: batch.len(),
            failures,
        })
    }

    /// Send a bulk request with exponential backoff retry logic.
    ///
    /// Also returns whether the request had to be re-sent. A failed attempt
    /// may still have been applied, in which case the re-sent documents come
    /// back as overwritten rather than created.
    async fn bulk_index_with_retry(
        &self,
        index: &str,
        batch: &[IndexDocument],
    ) -> Result<(BulkResponse, bool), SearchError> {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut attempt = 0;

        loop {
            match self.client.bulk_index(index, batch).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(
                            attempt = attempt,
                            count = batch.len(),
                            "Bulk index succeeded after retry"
                        );
                    }
                    return Ok((response, attempt > 0));
                }
                Err(e) if !e.is_retryable() => {
                    debug!(error = %e, "Non-retryable error encountered");
                    return Err(e);
                }
                Err(e) if attempt >= self.config.max_retries => {
                    warn!(
                        attempts = attempt + 1,
                        error = %e,
                        "Bulk index failed, giving up"
                    );
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    warn!(
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Bulk index failed, retrying"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms.saturating_mul(2), self.config.max_retry_delay_ms);
                }
            }
        }
    }
}

/// Item status for an index action that replaced an existing document.
const OVERWRITTEN: u16 = 200;

fn describe_status(status: u16) -> String {
    match status {
        OVERWRITTEN => "document already existed and was overwritten".to_string(),
        _ => format!("unexpected item status {}", status),
    }
}

/// Log the summary line and one line per rejected document.
fn report(result: &BulkResult) {
    info!(
        failed = result.failed(),
        submitted = result.submitted(),
        "{} insertion errors of {} items",
        result.failed(),
        result.submitted()
    );
    for failure in result.failures() {
        warn!(
            document_id = %failure.document_id,
            status = failure.status,
            error = %failure.error,
            "Document rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{documents, InMemoryEngine};
    use catalogue_indexer_repository::schema::module_index_schema;

    fn config(batch_size: usize, max_in_flight: usize, max_retries: u32) -> LoaderConfig {
        LoaderConfig {
            batch_size,
            max_in_flight,
            max_retries,
            ..LoaderConfig::default()
        }
    }

    async fn engine_with_index(engine: InMemoryEngine) -> Arc<InMemoryEngine> {
        engine.seed(&module_index_schema("modules", 10_000), &[]).await;
        Arc::new(engine)
    }

    #[tokio::test]
    async fn test_load_all_documents() {
        let engine = engine_with_index(InMemoryEngine::new()).await;
        let loader = BulkLoader::with_config(engine.clone(), config(3, 2, 0));
        let docs = documents("CS", 10);

        let result = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(result.submitted(), 10);
        assert_eq!(result.failed(), 0);
        assert!(result.is_complete());
        assert_eq!(engine.bulk_call_count(), 4);
        assert_eq!(engine.document_ids("modules").await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_rejected_document_is_recorded_not_fatal() {
        let engine = engine_with_index(InMemoryEngine::new().rejecting("CS0004")).await;
        let loader = BulkLoader::new(engine.clone());
        let docs = documents("CS", 10);

        let result = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(result.submitted(), 10);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.succeeded(), 9);
        assert_eq!(result.failures()[0].document_id, "CS0004");
        assert_eq!(result.failures()[0].status, 400);
        assert!(result.failures()[0].error.contains("mapper_parsing_exception"));
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_overwritten_document_is_a_failure() {
        let engine = engine_with_index(InMemoryEngine::new()).await;
        let loader = BulkLoader::new(engine.clone());
        let mut docs = documents("CS", 3);
        docs.push(docs[0].clone());

        let result = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(result.submitted(), 4);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.failures()[0].status, 200);
        assert!(result.failures()[0].error.contains("overwritten"));
    }

    #[tokio::test]
    async fn test_transport_error_aborts_with_partial_result() {
        let engine = engine_with_index(
            InMemoryEngine::new().failing_bulk_call(3, SearchError::connection("connection reset")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(2, 1, 0));
        let docs = documents("CS", 10);

        let err = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap_err();

        assert_eq!(err.source, SearchError::connection("connection reset"));
        assert_eq!(err.partial.submitted(), 4);
        assert_eq!(err.partial.failed(), 0);
        assert_eq!(err.partial.completion(), Completion::Aborted);
        assert_eq!(engine.bulk_call_count(), 3);
        assert_eq!(engine.document_ids("modules").await.unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_drains_batches_in_flight() {
        let engine = engine_with_index(
            InMemoryEngine::new()
                .rejecting("CS0000")
                .rejecting("CS0005")
                .delaying_bulk_call(1, Duration::from_millis(50))
                .failing_bulk_call(2, SearchError::connection("connection reset")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(5, 2, 0));

        let err = loader
            .bulk_load("modules", &documents("CS", 15), &CancellationSignal::new())
            .await
            .unwrap_err();

        // The slow batch landed and is counted; the third batch is never sent.
        assert_eq!(err.source, SearchError::connection("connection reset"));
        assert_eq!(err.partial.submitted(), 5);
        assert_eq!(err.partial.failed(), 1);
        assert_eq!(err.partial.completion(), Completion::Aborted);
        assert_eq!(engine.bulk_call_count(), 2);
        assert_eq!(engine.document_ids("modules").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_aborted_result_keeps_rejections_of_completed_batches() {
        let engine = engine_with_index(
            InMemoryEngine::new()
                .rejecting("CS0001")
                .failing_bulk_call(2, SearchError::connection("connection reset")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(2, 1, 0));

        let err = loader
            .bulk_load("modules", &documents("CS", 6), &CancellationSignal::new())
            .await
            .unwrap_err();

        assert_eq!(err.partial.submitted(), 2);
        assert_eq!(err.partial.failures()[0].document_id, "CS0001");
        assert_eq!(err.partial.completion(), Completion::Aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_of_applied_batch_counts_overwrites_as_indexed() {
        let engine = engine_with_index(
            InMemoryEngine::new()
                .applying_then_failing_bulk_call(1, SearchError::connection("operation timed out")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(10, 1, 3));

        let result = loader
            .bulk_load("modules", &documents("CS", 10), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(engine.bulk_call_count(), 2);
        assert_eq!(result.submitted(), 10);
        assert_eq!(result.failed(), 0);
        assert!(result.is_complete());
        assert_eq!(engine.document_ids("modules").await.unwrap().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_transient_error_is_retried_then_aborts() {
        let engine = engine_with_index(
            InMemoryEngine::new()
                .failing_bulk_calls_from(1, SearchError::bulk_index(503, "cluster unavailable")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(5, 1, 2));
        let docs = documents("CS", 10);

        let err = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap_err();

        assert_eq!(engine.bulk_call_count(), 3);
        assert_eq!(err.partial.submitted(), 0);
        assert_eq!(err.partial.completion(), Completion::Aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds() {
        let engine = engine_with_index(
            InMemoryEngine::new().failing_bulk_call(1, SearchError::connection("timed out")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(10, 1, 3));
        let docs = documents("CS", 10);

        let result = loader
            .bulk_load("modules", &docs, &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(engine.bulk_call_count(), 2);
        assert_eq!(result.submitted(), 10);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let engine = engine_with_index(
            InMemoryEngine::new().failing_bulk_calls_from(1, SearchError::bulk_index(401, "unauthorized")),
        )
        .await;
        let loader = BulkLoader::with_config(engine.clone(), config(10, 1, 3));

        let err = loader
            .bulk_load("modules", &documents("CS", 10), &CancellationSignal::new())
            .await
            .unwrap_err();

        assert_eq!(engine.bulk_call_count(), 1);
        assert!(matches!(err.source, SearchError::BulkIndexError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_malformed_response_is_a_transport_error() {
        let engine = engine_with_index(InMemoryEngine::new().truncating_responses()).await;
        let loader = BulkLoader::new(engine.clone());

        let err = loader
            .bulk_load("modules", &documents("CS", 10), &CancellationSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err.source, SearchError::ParseError(_)));
        assert_eq!(err.partial.submitted(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let engine = engine_with_index(InMemoryEngine::new()).await;
        let loader = BulkLoader::new(engine.clone());
        let cancel = CancellationSignal::new();
        cancel.cancel();

        let result = loader
            .bulk_load("modules", &documents("CS", 10), &cancel)
            .await
            .unwrap();

        assert_eq!(result.submitted(), 0);
        assert_eq!(result.completion(), Completion::Cancelled);
        assert_eq!(engine.bulk_call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_mid_run_stops_new_batches() {
        let cancel = CancellationSignal::new();
        let engine =
            engine_with_index(InMemoryEngine::new().cancelling_after_bulk_call(2, cancel.clone()))
                .await;
        let loader = BulkLoader::with_config(engine.clone(), config(2, 1, 0));

        let result = loader
            .bulk_load("modules", &documents("CS", 10), &cancel)
            .await
            .unwrap();

        assert_eq!(result.submitted(), 4);
        assert_eq!(result.completion(), Completion::Cancelled);
        assert_eq!(engine.bulk_call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_after_last_batch_is_complete() {
        let cancel = CancellationSignal::new();
        let engine =
            engine_with_index(InMemoryEngine::new().cancelling_after_bulk_call(5, cancel.clone()))
                .await;
        let loader = BulkLoader::with_config(engine.clone(), config(2, 1, 0));

        let result = loader
            .bulk_load("modules", &documents("CS", 10), &cancel)
            .await
            .unwrap();

        assert_eq!(result.submitted(), 10);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_in_flight_batches_are_bounded() {
        let engine = engine_with_index(InMemoryEngine::new()).await;
        let loader = BulkLoader::with_config(engine.clone(), config(2, 3, 0));

        let result = loader
            .bulk_load("modules", &documents("CS", 20), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(result.submitted(), 20);
        assert_eq!(engine.bulk_call_count(), 10);
        assert!(engine.max_bulk_in_flight() <= 3);
        assert!(engine.max_bulk_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let engine = engine_with_index(InMemoryEngine::new()).await;
        let loader = BulkLoader::new(engine.clone());

        let result = loader
            .bulk_load("modules", &[], &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(result, BulkResult::empty(Completion::Complete));
        assert_eq!(engine.bulk_call_count(), 0);
    }
}
