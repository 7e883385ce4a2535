//! # Catalogue Indexer
//!
//! Main library for the module catalogue indexer.
//!
//! This crate provides the command line settings, the dependency wiring and
//! the catalogue file reader used by the `catalogue-indexer` binary.

pub mod catalogue;
pub mod config;

pub use config::{Cli, Command, Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The catalogue file is not a JSON array of objects.
    #[error("Invalid catalogue: {0}")]
    CatalogueError(#[from] serde_json::Error),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] catalogue_indexer_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] catalogue_indexer_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
