//! Document normalizer.
//!
//! Validates catalogue records and derives the fields the index needs from
//! them.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::ValidationError;
use catalogue_indexer_repository::schema::{
    ATTRIBUTES_FIELD, ATTRIBUTE_LIST_FIELD, MODULE_CODE_FIELD,
};
use catalogue_indexer_shared::{CatalogueRecord, IndexDocument};

/// Field names the normalizer reads and writes.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Field holding the record identifier.
    pub id_field: String,
    /// Field holding the free-form attributes object.
    pub attributes_field: String,
    /// Derived field receiving the attribute keys.
    pub attribute_list_field: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            id_field: MODULE_CODE_FIELD.to_string(),
            attributes_field: ATTRIBUTES_FIELD.to_string(),
            attribute_list_field: ATTRIBUTE_LIST_FIELD.to_string(),
        }
    }
}

/// Normalizer that transforms catalogue records into index documents.
///
/// The normalizer:
/// - Requires every record to carry a non-empty string identifier
/// - Adds the sorted list of attribute keys when a record has attributes
/// - Leaves every other field untouched
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer for the module catalogue field names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom field names.
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize every record, preserving order.
    ///
    /// Fails on the first invalid record; no documents are returned in that
    /// case.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn normalize(&self, records: &[CatalogueRecord]) -> Result<Vec<IndexDocument>, ValidationError> {
        let documents = records
            .iter()
            .enumerate()
            .map(|(position, record)| self.normalize_record(position, record))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(document_count = documents.len(), "Normalized catalogue records");
        Ok(documents)
    }

    fn normalize_record(
        &self,
        position: usize,
        record: &CatalogueRecord,
    ) -> Result<IndexDocument, ValidationError> {
        let id = match record.get(&self.config.id_field) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::String(_)) => {
                return Err(ValidationError::new(
                    position,
                    format!("{} is empty", self.config.id_field),
                ))
            }
            Some(_) => {
                return Err(ValidationError::new(
                    position,
                    format!("{} must be a string", self.config.id_field),
                ))
            }
            None => {
                return Err(ValidationError::new(
                    position,
                    format!("missing {}", self.config.id_field),
                ))
            }
        };

        let mut body = record.fields().clone();

        match record.get(&self.config.attributes_field) {
            None | Some(Value::Null) => {}
            Some(Value::Object(attributes)) => {
                // Sorted so the output does not depend on map iteration order.
                let mut keys: Vec<&String> = attributes.keys().collect();
                keys.sort();
                let keys = keys.into_iter().map(|key| Value::String(key.clone())).collect();
                body.insert(self.config.attribute_list_field.clone(), Value::Array(keys));
            }
            Some(_) => {
                return Err(ValidationError::new(
                    position,
                    format!("{} of {} must be an object", self.config.attributes_field, id),
                ))
            }
        }

        Ok(IndexDocument::new(id, body))
    }
}
