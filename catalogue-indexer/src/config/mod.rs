//! Configuration and dependency wiring for the catalogue indexer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{Cli, Command, Settings};
