//! Documents ready to be submitted to the search index.

use serde_json::{Map, Value};

/// A normalized catalogue record, ready for indexing.
///
/// The identifier doubles as the document `_id` in the index, so reindexing
/// the same catalogue produces the same set of document ids.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    id: String,
    body: Map<String, Value>,
}

impl IndexDocument {
    /// Create a document with the given identifier and body.
    pub fn new(id: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// The document identifier (the module code).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The JSON body submitted to the index.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Look up a body field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }
}
