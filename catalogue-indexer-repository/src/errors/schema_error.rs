//! Schema error types.
//!
//! Errors raised while checking an index schema or rebuilding the index from
//! it. Any of these stops a reindex before documents are loaded.

use thiserror::Error;

use super::SearchError;

/// Errors that can occur while rebuilding an index schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The schema references an analysis component it does not declare.
    #[error("Invalid schema for index {index}: {reason}")]
    Invalid { index: String, reason: String },

    /// Deleting the previous index failed for a reason other than it not existing.
    #[error("Failed to delete index {index}: {source}")]
    Delete {
        index: String,
        #[source]
        source: SearchError,
    },

    /// Creating the index failed.
    #[error("Failed to create index {index}: {source}")]
    Create {
        index: String,
        #[source]
        source: SearchError,
    },

    /// The engine answered the creation request without acknowledging it.
    #[error("Creation of index {0} was not acknowledged")]
    NotAcknowledged(String),
}

impl SchemaError {
    /// Create an invalid schema error.
    pub fn invalid(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            index: index.into(),
            reason: reason.into(),
        }
    }

    /// Create a deletion error.
    pub fn delete(index: impl Into<String>, source: SearchError) -> Self {
        Self::Delete {
            index: index.into(),
            source,
        }
    }

    /// Create a creation error.
    pub fn create(index: impl Into<String>, source: SearchError) -> Self {
        Self::Create {
            index: index.into(),
            source,
        }
    }
}
