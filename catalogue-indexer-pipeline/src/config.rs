//! Configuration for a reindex run.

use crate::loader::LoaderConfig;
use crate::processor::NormalizerConfig;
use catalogue_indexer_repository::schema::{
    module_index_schema, result_window, DEFAULT_INDEX_NAME, DEFAULT_RESULT_WINDOW_HEADROOM,
};
use catalogue_indexer_repository::IndexSchema;

/// Everything a [`Reindexer`](crate::Reindexer) needs to know besides the
/// engine client.
#[derive(Debug, Clone)]
pub struct ReindexConfig {
    /// Name of the index to rebuild.
    pub index_name: String,
    /// Extra result window room on top of the catalogue size.
    pub result_window_headroom: usize,
    /// Fixed result window, overriding the size-derived one.
    pub max_result_window: Option<u64>,
    pub loader: LoaderConfig,
    pub normalizer: NormalizerConfig,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            result_window_headroom: DEFAULT_RESULT_WINDOW_HEADROOM,
            max_result_window: None,
            loader: LoaderConfig::default(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl ReindexConfig {
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_result_window_headroom(mut self, headroom: usize) -> Self {
        self.result_window_headroom = headroom;
        self
    }

    pub fn with_max_result_window(mut self, max_result_window: u64) -> Self {
        self.max_result_window = Some(max_result_window);
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Result window for a catalogue of `catalogue_size` records.
    pub fn result_window_for(&self, catalogue_size: usize) -> u64 {
        self.max_result_window
            .unwrap_or_else(|| result_window(catalogue_size, self.result_window_headroom))
    }

    /// Schema of the index for a catalogue of `catalogue_size` records.
    pub fn schema_for(&self, catalogue_size: usize) -> IndexSchema {
        module_index_schema(&self.index_name, self.result_window_for(catalogue_size))
    }
}
