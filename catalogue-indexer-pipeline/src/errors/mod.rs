//! Error types for the reindex pipeline.
//!
//! Only two kinds of failure abort a run once it has started touching the
//! engine: a [`SchemaError`] (nothing is loaded) and a [`TransportError`]
//! (what was loaded so far stands). Rejected documents are not errors; they
//! are reported in the [`BulkResult`].

use catalogue_indexer_repository::{SchemaError, SearchError};
use catalogue_indexer_shared::BulkResult;
use thiserror::Error;

/// A catalogue record that cannot be turned into an index document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid record at position {position}: {message}")]
pub struct ValidationError {
    /// Zero-based position of the record in the input.
    pub position: usize,
    pub message: String,
}

impl ValidationError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// The engine could not be reached (or refused the request as a whole)
/// while documents were being loaded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Transport error after {partial}: {source}")]
pub struct TransportError {
    #[source]
    pub source: SearchError,
    /// Outcome of the batches that completed before the failure.
    pub partial: BulkResult,
}

/// Errors that can occur in the reindex pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A record failed validation; nothing was sent to the engine.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The index could not be rebuilt; no documents were submitted.
    #[error("Schema rebuild failed: {0}")]
    Schema(#[from] SchemaError),

    /// Loading stopped on a transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The run was cancelled before the index was rebuilt; no changes were made.
    #[error("Reindex cancelled before the index was rebuilt")]
    Cancelled,

    /// A pipeline task panicked or was aborted.
    #[error("Task error: {0}")]
    TaskError(String),
}

impl PipelineError {
    /// The partial bulk result, if the run got far enough to load documents.
    pub fn partial_result(&self) -> Option<&BulkResult> {
        match self {
            Self::Transport(e) => Some(&e.partial),
            _ => None,
        }
    }
}
