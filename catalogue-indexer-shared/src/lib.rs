//! # Catalogue Indexer Shared
//!
//! Data types passed between the stages of the catalogue reindex pipeline:
//! the raw records supplied by the collector, the documents derived from
//! them, and the outcome of a bulk load.

mod bulk;
mod document;
mod record;

pub use bulk::{BulkResult, Completion, DocumentFailure};
pub use document::IndexDocument;
pub use record::CatalogueRecord;
