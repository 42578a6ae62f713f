//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search cluster or building index definitions.

use thiserror::Error;

/// Errors that can occur during search cluster operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to establish connection to the search cluster.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The bulk request was rejected or could not be sent.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete an index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// A read-only query (exists, count, node listing) failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a response from the search cluster.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A catalog column type has no index field type.
    #[error("Data type {column_type} of column {column} is unknown")]
    UnsupportedColumnType { column: String, column_type: String },
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported column type error.
    pub fn unsupported_column_type(column: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self::UnsupportedColumnType {
            column: column.into(),
            column_type: column_type.into(),
        }
    }

    /// Whether the error is a configuration problem that retrying cannot fix.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnsupportedColumnType { .. })
    }
}
