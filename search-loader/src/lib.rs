//! # Search Loader
//!
//! Main library for the search loader.
//!
//! This crate provides configuration, dependency wiring, catalog and
//! credential lookup, and index preparation for loading exported tables into
//! the search cluster.

pub mod catalog;
pub mod config;
pub mod prepare;
pub mod secrets;

pub use catalog::{ColumnSource, GlueCatalog, GlueTableFile};
pub use config::{Dependencies, Settings};
pub use prepare::IndexPreparer;
pub use secrets::{EnvSecretResolver, SecretResolver};

use thiserror::Error;

/// Errors that can occur during loader initialization or execution.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Credentials could not be resolved.
    #[error("Secret error: {0}")]
    SecretError(String),

    /// Table columns could not be read from the catalog.
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] search_loader_ingest::IngestError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_loader_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LoaderError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a secret error.
    pub fn secret(msg: impl Into<String>) -> Self {
        Self::SecretError(msg.into())
    }

    /// Create a catalog error.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::CatalogError(msg.into())
    }
}
