//! Command line and environment settings.
//!
//! Every option can also be given through the environment (or a `.env`
//! file), which is how the indexer is configured when run from a job.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::IndexingError;
use catalogue_indexer_pipeline::{LoaderConfig, ReindexConfig};
use catalogue_indexer_repository::schema::LEVEL_ANALYZER;

#[derive(Debug, Parser)]
#[command(name = "catalogue-indexer")]
#[command(about = "Rebuild the module catalogue search index", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete and rebuild the index from a catalogue file
    #[command(arg_required_else_help = true)]
    Reindex {
        /// JSON array of module records
        file: PathBuf,
    },
    /// Run an analyzer of the live index against module codes
    #[command(arg_required_else_help = true)]
    Analyze {
        codes: Vec<String>,
        #[arg(long, default_value = LEVEL_ANALYZER)]
        analyzer: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// OpenSearch URL
    #[arg(long, env = "OPENSEARCH_URL", default_value = "http://localhost:9200", global = true)]
    pub opensearch_url: String,

    /// Index name
    #[arg(long, env = "INDEX_NAME", default_value = "modules", global = true)]
    pub index_name: String,

    /// Documents per bulk request
    #[arg(long, env = "BATCH_SIZE", default_value = "1000", global = true)]
    pub batch_size: usize,

    /// Bulk requests in flight at once
    #[arg(long, env = "MAX_IN_FLIGHT", default_value = "2", global = true)]
    pub max_in_flight: usize,

    /// Result window room on top of the catalogue size
    #[arg(long, env = "RESULT_WINDOW_HEADROOM", default_value = "5000", global = true)]
    pub result_window_headroom: usize,

    /// Fixed result window, overriding the size-derived one
    #[arg(long, env = "MAX_RESULT_WINDOW", global = true)]
    pub max_result_window: Option<u64>,

    /// Retries for a bulk request failing with a transient error
    #[arg(long, env = "MAX_RETRIES", default_value = "3", global = true)]
    pub max_retries: u32,
}

impl Settings {
    /// Build the reindex configuration, rejecting values the loader cannot use.
    pub fn reindex_config(&self) -> Result<ReindexConfig, IndexingError> {
        if self.index_name.is_empty() {
            return Err(IndexingError::config("index name must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(IndexingError::config("batch size must be at least 1"));
        }
        if self.max_in_flight == 0 {
            return Err(IndexingError::config("max in flight must be at least 1"));
        }

        let loader = LoaderConfig {
            batch_size: self.batch_size,
            max_in_flight: self.max_in_flight,
            max_retries: self.max_retries,
            ..LoaderConfig::default()
        };

        let mut config = ReindexConfig::default()
            .with_index_name(self.index_name.clone())
            .with_result_window_headroom(self.result_window_headroom)
            .with_loader(loader);
        if let Some(window) = self.max_result_window {
            config = config.with_max_result_window(window);
        }
        Ok(config)
    }
}
