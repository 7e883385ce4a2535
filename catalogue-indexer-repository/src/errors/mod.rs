//! Error types for the catalogue indexer repository.

mod schema_error;
mod search_error;

pub use schema_error::SchemaError;
pub use search_error::SearchError;
