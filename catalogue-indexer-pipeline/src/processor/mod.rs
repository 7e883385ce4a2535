//! Processor module for the reindex pipeline.
//!
//! Turns raw catalogue records into documents ready for indexing.

mod normalizer;

pub use normalizer::{Normalizer, NormalizerConfig};
