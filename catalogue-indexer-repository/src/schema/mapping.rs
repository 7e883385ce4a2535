//! Field mapping declarations.

use std::collections::BTreeMap;

use serde::Serialize;

/// Field data types used by the catalogue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
}

/// Mapping for a single field, with optional sub-fields (multi-fields)
/// indexing the same value in a different way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_above: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fielddata: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl FieldMapping {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            analyzer: None,
            ignore_above: None,
            fielddata: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    pub fn short() -> Self {
        Self::new(FieldType::Short)
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Skip indexing values longer than `limit` characters (keyword fields).
    pub fn with_ignore_above(mut self, limit: u32) -> Self {
        self.ignore_above = Some(limit);
        self
    }

    /// Allow sorting and aggregating on an analyzed text field.
    pub fn with_fielddata(mut self, enabled: bool) -> Self {
        self.fielddata = Some(enabled);
        self
    }

    pub fn with_sub_field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }

    /// Every analyzer this mapping references, including those of its
    /// sub-fields, paired with the dotted path of the referencing field.
    pub fn analyzer_references(&self, path: &str) -> Vec<(String, String)> {
        let mut references = Vec::new();
        if let Some(analyzer) = &self.analyzer {
            references.push((path.to_string(), analyzer.clone()));
        }
        for (name, sub_field) in &self.fields {
            references.extend(sub_field.analyzer_references(&format!("{}.{}", path, name)));
        }
        references
    }
}
