//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesAnalyzeParts, IndicesCreateParts, IndicesDeleteParts, IndicesRefreshParts},
    BulkParts, CountParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::schema::IndexSchema;
use crate::types::{BulkItem, BulkResponse, CreateIndexResponse};
use catalogue_indexer_shared::IndexDocument;

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// use catalogue_indexer_repository::{schema, OpenSearchClient, SearchEngineClient};
///
/// let client = OpenSearchClient::new("http://localhost:9200").await?;
/// let schema = schema::module_index_schema("modules", 20_000);
///
/// client.delete_index(schema.name()).await.ok();
/// client.create_index(&schema).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Build the interleaved action/document body of a bulk request.
    fn bulk_body(documents: &[IndexDocument]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            body.push(json!({ "index": { "_id": doc.id() } }).into());
            body.push(Value::Object(doc.body().clone()).into());
        }
        body
    }

    /// Parse a bulk response body into per-item outcomes.
    ///
    /// Each entry of `items` is an object keyed by the action name; only the
    /// inner object matters here.
    fn parse_bulk_response(body: &Value) -> Result<BulkResponse, SearchError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::parse("bulk response has no items array"))?;

        let items = items
            .iter()
            .map(|item| {
                let outcome = item
                    .as_object()
                    .and_then(|actions| actions.values().next())
                    .ok_or_else(|| SearchError::parse(format!("malformed bulk item: {}", item)))?;

                let status = outcome
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .ok_or_else(|| SearchError::parse(format!("bulk item without status: {}", item)))?;

                Ok(BulkItem {
                    id: outcome.get("_id").and_then(Value::as_str).map(str::to_string),
                    status,
                    error: outcome.get("error").map(Self::error_detail),
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        Ok(BulkResponse {
            took: body.get("took").and_then(Value::as_u64).unwrap_or(0),
            errors: body.get("errors").and_then(Value::as_bool).unwrap_or(false),
            items,
        })
    }

    /// Render an engine error object as `type: reason`, falling back to the
    /// raw JSON when those fields are missing.
    fn error_detail(error: &Value) -> String {
        match (
            error.get("type").and_then(Value::as_str),
            error.get("reason").and_then(Value::as_str),
        ) {
            (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
            (Some(kind), None) => kind.to_string(),
            _ => error.to_string(),
        }
    }

    /// Read the body of a failed response for error reporting.
    async fn failure_text(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            debug!(index = %index, "Index did not exist");
            return Err(SearchError::index_not_found(index));
        }
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            error!(status = %status, body = %error_body, "Delete index request failed");
            return Err(SearchError::index_deletion(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, "Deleted index");
        Ok(())
    }

    #[instrument(skip(self, schema), fields(index = %schema.name()))]
    async fn create_index(&self, schema: &IndexSchema) -> Result<CreateIndexResponse, SearchError> {
        let body = schema.to_create_body()?;

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(schema.name()))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchError::index_creation(format!(
                "Create failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let created = CreateIndexResponse {
            acknowledged: body["acknowledged"].as_bool().unwrap_or(false),
            shards_acknowledged: body["shards_acknowledged"].as_bool().unwrap_or(false),
        };

        info!(
            acknowledged = created.acknowledged,
            shards_acknowledged = created.shards_acknowledged,
            "Created index"
        );
        Ok(created)
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkResponse, SearchError> {
        if documents.is_empty() {
            return Ok(BulkResponse::default());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(Self::bulk_body(documents))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(status.as_u16(), error_body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let parsed = Self::parse_bulk_response(&body)?;
        debug!(took = parsed.took, errors = parsed.errors, "Bulk request completed");
        Ok(parsed)
    }

    async fn refresh_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            return Err(SearchError::query(format!(
                "Refresh failed with status {}: {}",
                status, error_body
            )));
        }
        Ok(())
    }

    async fn count_documents(&self, index: &str) -> Result<u64, SearchError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchError::index_not_found(index));
        }
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            return Err(SearchError::query(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        body["count"]
            .as_u64()
            .ok_or_else(|| SearchError::parse("count response has no count"))
    }

    async fn analyze(
        &self,
        index: &str,
        analyzer: &str,
        text: &str,
    ) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .indices()
            .analyze(IndicesAnalyzeParts::Index(index))
            .body(json!({ "analyzer": analyzer, "text": text }))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchError::index_not_found(index));
        }
        if !status.is_success() {
            let error_body = Self::failure_text(response).await;
            return Err(SearchError::query(format!(
                "Analyze failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(body["tokens"]
            .as_array()
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|t| t["token"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let status = health["status"].as_str().unwrap_or("unknown");
        info!(status = %status, "OpenSearch cluster status");

        Ok(status == "green" || status == "yellow")
    }
}
