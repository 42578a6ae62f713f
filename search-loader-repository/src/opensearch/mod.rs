//! OpenSearch implementation of the search cluster interfaces.
//!
//! This module provides the client used for bulk submission and index
//! administration, and the index definition builders.

mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::{
    build_field_mappings, build_index_body, index_name_for, IndexSettings, DATE_FORMAT,
};
