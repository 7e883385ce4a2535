//! Raw catalogue records as supplied by the external collector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single module record from the catalogue.
///
/// Records are free-form JSON objects. The pipeline only interprets a handful
/// of fields (the module code and the `attributes` object); everything else is
/// carried through to the index untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogueRecord {
    fields: Map<String, Value>,
}

impl CatalogueRecord {
    /// Create a record from its JSON fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Look up a field that is expected to hold a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// All fields of the record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for CatalogueRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
