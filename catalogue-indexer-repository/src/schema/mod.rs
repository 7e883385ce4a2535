//! Index schema model.
//!
//! An [`IndexSchema`] bundles everything the engine needs to create an index
//! in one request: index-level settings, the analysis section and the field
//! mappings. [`IndexSchema::validate`] checks the schema's internal references
//! before anything is sent.

mod analysis;
mod catalogue;
mod mapping;

pub use analysis::{
    AnalysisError, Analysis, CustomAnalyzer, TokenFilter, Tokenizer, BUILTIN_ANALYZERS,
};
pub use catalogue::{
    level_analysis, module_index_schema, result_window, ATTRIBUTES_FIELD, ATTRIBUTE_LIST_FIELD,
    DEFAULT_INDEX_NAME, DEFAULT_MAX_RESULT_WINDOW, DEFAULT_RESULT_WINDOW_HEADROOM,
    LEVEL_ANALYZER, MODULE_CODE_FIELD,
};
pub use mapping::{FieldMapping, FieldType};

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::errors::{SchemaError, SearchError};

/// Index-level settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexSettings {
    pub number_of_shards: Option<u32>,
    pub number_of_replicas: Option<u32>,
    /// Largest `from + size` a single search may request.
    pub max_result_window: Option<u64>,
}

impl IndexSettings {
    pub fn with_max_result_window(mut self, max_result_window: u64) -> Self {
        self.max_result_window = Some(max_result_window);
        self
    }

    fn to_json(&self) -> Map<String, Value> {
        let mut index = Map::new();
        if let Some(shards) = self.number_of_shards {
            index.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            index.insert("number_of_replicas".to_string(), json!(replicas));
        }
        if let Some(window) = self.max_result_window {
            index.insert("max_result_window".to_string(), json!(window));
        }
        index
    }
}

/// The complete definition of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    name: String,
    settings: IndexSettings,
    analysis: Analysis,
    properties: BTreeMap<String, FieldMapping>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: IndexSettings::default(),
            analysis: Analysis::default(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_analysis(mut self, analysis: Analysis) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.properties.insert(name.into(), mapping);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.properties.get(name)
    }

    /// Check the schema before it is sent to the engine.
    ///
    /// The index name must be a valid engine index name, every analyzer a
    /// field mapping references must be declared (or built in), and every
    /// tokenizer and filter a declared analyzer references must be declared
    /// (or built in).
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::invalid(&self.name, "index name is empty"));
        }
        if self.name.starts_with(['-', '_', '+'])
            || self
                .name
                .chars()
                .any(|c| c.is_uppercase() || c.is_whitespace() || "\\/*?\"<>|,#:".contains(c))
        {
            return Err(SchemaError::invalid(
                &self.name,
                "index names must be lowercase and must not contain whitespace or \\/*?\"<>|,#:",
            ));
        }

        self.analysis
            .check_references()
            .map_err(|reason| SchemaError::invalid(&self.name, reason))?;

        for (field, mapping) in &self.properties {
            for (path, analyzer) in mapping.analyzer_references(field) {
                if !self.analysis.provides_analyzer(&analyzer) {
                    return Err(SchemaError::invalid(
                        &self.name,
                        format!("field {} references undeclared analyzer {}", path, analyzer),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Render the body of the index creation request.
    pub fn to_create_body(&self) -> Result<Value, SearchError> {
        let mut settings = Map::new();
        if !self.analysis.is_empty() {
            let analysis = serde_json::to_value(&self.analysis)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?;
            settings.insert("analysis".to_string(), analysis);
        }
        let index = self.settings.to_json();
        if !index.is_empty() {
            settings.insert("index".to_string(), Value::Object(index));
        }

        let properties = serde_json::to_value(&self.properties)
            .map_err(|e| SearchError::SerializationError(e.to_string()))?;

        Ok(json!({
            "settings": settings,
            "mappings": {
                "properties": properties
            }
        }))
    }
}
