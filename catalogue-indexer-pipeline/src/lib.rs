//! # Catalogue Indexer Pipeline
//!
//! This crate provides the pipeline that rebuilds the module catalogue
//! search index from a catalogue snapshot.
//!
//! ## Architecture
//!
//! The pipeline runs three stages:
//!
//! 1. **Normalizer**: Turns catalogue records into index documents
//! 2. **Schema Manager**: Deletes and recreates the index with its schema
//! 3. **Loader**: Bulk-indexes the documents in batches
//!
//! The **Orchestrator** ([`Reindexer`]) runs them in order, holding the
//! loader back until the index has been recreated.

pub mod cancellation;
pub mod config;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod schema_manager;

#[cfg(test)]
mod testing;

pub use cancellation::CancellationSignal;
pub use config::ReindexConfig;
pub use errors::{PipelineError, TransportError, ValidationError};
pub use loader::{BulkLoader, LoaderConfig};
pub use orchestrator::{ReindexReport, Reindexer};
pub use processor::{Normalizer, NormalizerConfig};
pub use schema_manager::SchemaManager;
