//! # Catalogue Indexer Repository
//!
//! This crate provides the trait and implementation for talking to the
//! search engine, and the model of the index schema the catalogue is loaded
//! into. It includes definitions for errors, interfaces, the schema and a
//! concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod schema;
pub mod types;

pub use errors::{SchemaError, SearchError};
pub use interfaces::SearchEngineClient;
pub use opensearch::OpenSearchClient;
pub use schema::IndexSchema;
pub use types::{BulkItem, BulkResponse, CreateIndexResponse};
