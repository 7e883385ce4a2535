//! Outcome of a bulk load.

use std::fmt;

/// How far a bulk load got before it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every batch was submitted.
    Complete,
    /// The caller raised the cancellation signal; later batches were never sent.
    Cancelled,
    /// A transport error stopped the load; later batches were never sent.
    Aborted,
}

/// A document the engine refused to index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    /// Identifier of the rejected document.
    pub document_id: String,
    /// Item status reported by the engine.
    pub status: u16,
    /// Error detail reported by the engine.
    pub error: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {}): {}", self.document_id, self.status, self.error)
    }
}

/// Summary of a bulk load: how many documents were submitted and which of
/// them were rejected.
///
/// A `BulkResult` is only ever built once, at the end of a load, and has no
/// mutating methods.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResult {
    submitted: usize,
    failures: Vec<DocumentFailure>,
    completion: Completion,
}

impl BulkResult {
    /// Create a result from its parts.
    pub fn new(submitted: usize, failures: Vec<DocumentFailure>, completion: Completion) -> Self {
        Self {
            submitted,
            failures,
            completion,
        }
    }

    /// A result for a load that submitted nothing.
    pub fn empty(completion: Completion) -> Self {
        Self::new(0, Vec::new(), completion)
    }

    /// Number of documents sent to the engine.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Number of documents the engine rejected.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of documents the engine accepted.
    pub fn succeeded(&self) -> usize {
        self.submitted.saturating_sub(self.failures.len())
    }

    /// Every rejected document with its error detail.
    pub fn failures(&self) -> &[DocumentFailure] {
        &self.failures
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Whether every batch was submitted.
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}

impl fmt::Display for BulkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} documents indexed, {} failures",
            self.succeeded(),
            self.submitted,
            self.failed()
        )?;
        match self.completion {
            Completion::Complete => Ok(()),
            Completion::Cancelled => write!(f, " (cancelled)"),
            Completion::Aborted => write!(f, " (aborted)"),
        }
    }
}
