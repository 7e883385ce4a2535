//! Reading the catalogue snapshot produced by the module collector.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::IndexingError;
use catalogue_indexer_shared::CatalogueRecord;

/// Read a catalogue file: a JSON array of module objects.
pub fn read_catalogue(path: &Path) -> Result<Vec<CatalogueRecord>, IndexingError> {
    let contents = fs::read_to_string(path)?;
    let records = parse_catalogue(&contents)?;
    info!(path = %path.display(), record_count = records.len(), "Read catalogue");
    Ok(records)
}

pub fn parse_catalogue(contents: &str) -> Result<Vec<CatalogueRecord>, IndexingError> {
    Ok(serde_json::from_str(contents)?)
}
