//! # Search Loader Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search cluster. It includes definitions for errors, the bulk submission
//! and index administration interfaces, index definitions built from catalog
//! metadata, and a concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::SearchError;
pub use interfaces::{BulkSubmitter, IndexAdmin};
pub use opensearch::{
    build_field_mappings, build_index_body, index_name_for, IndexSettings, OpenSearchClient,
};
pub use types::{BulkItemFailure, BulkOutcome};
