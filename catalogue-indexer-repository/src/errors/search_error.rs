//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search engine.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Failed to reach the search engine, or the request never completed.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The target index does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Failed to delete an index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The engine refused a bulk request as a whole.
    #[error("Bulk index error (status {status}): {message}")]
    BulkIndexError { status: u16, message: String },

    /// A refresh, count or analyze request failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index not found error.
    pub fn index_not_found(index: impl Into<String>) -> Self {
        Self::IndexNotFound(index.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk index error for a rejected bulk request.
    pub fn bulk_index(status: u16, msg: impl Into<String>) -> Self {
        Self::BulkIndexError {
            status,
            message: msg.into(),
        }
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the failure is transient and the request is worth retrying.
    ///
    /// Connection failures and throttling/unavailability statuses are
    /// retryable. Authentication failures, malformed requests and malformed
    /// responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::BulkIndexError { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            Self::IndexNotFound(_)
            | Self::IndexDeletionError(_)
            | Self::IndexCreationError(_)
            | Self::QueryError(_)
            | Self::ParseError(_)
            | Self::SerializationError(_) => false,
        }
    }
}
