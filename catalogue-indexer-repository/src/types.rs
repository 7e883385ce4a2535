//! Response types for search engine operations.

/// Outcome of one action inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    /// Document id the engine reported for the action, if any.
    pub id: Option<String>,
    /// HTTP-style status of the action (201 for a newly created document).
    pub status: u16,
    /// Error detail when the action was rejected.
    pub error: Option<String>,
}

impl BulkItem {
    /// Status the engine reports for a newly created document.
    pub const CREATED: u16 = 201;

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: Self::CREATED,
            error: None,
        }
    }

    pub fn rejected(id: impl Into<String>, status: u16, error: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status,
            error: Some(error.into()),
        }
    }

    /// Whether the action created a new document.
    pub fn is_created(&self) -> bool {
        self.status == Self::CREATED
    }
}

/// Response to a bulk request, one item per submitted action, in
/// submission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkResponse {
    /// Time the engine spent on the request, in milliseconds.
    pub took: u64,
    /// Whether any item failed.
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

/// Response to an index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateIndexResponse {
    /// The cluster accepted the new index.
    pub acknowledged: bool,
    /// The required shard copies started before the request timed out.
    pub shards_acknowledged: bool,
}
