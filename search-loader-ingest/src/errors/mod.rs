//! Error types for the search loader ingest.

use search_loader_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while loading a unit of work.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A record carries no `_id` field.
    #[error("Record {position} of the batch has no _id field")]
    MissingIdentifier { position: usize },

    /// A record's `_id` is neither a string nor a number.
    #[error("Record {position} of the batch has an unusable _id: {value}")]
    InvalidIdentifier { position: usize, value: String },

    /// A source line is not a JSON object.
    #[error("Line {line} is not a JSON object: {source}")]
    ParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("Encoding error: {0}")]
    EncodingError(#[from] serde_json::Error),

    /// The bulk request could not be sent or was rejected as a whole.
    #[error("Bulk submission of batch {batch} to {index} failed: {source}")]
    SubmissionFailed {
        index: String,
        batch: usize,
        #[source]
        source: SearchError,
    },

    /// The bulk request was accepted but some documents were not indexed.
    #[error("Bulk submission of batch {batch} to {index} rejected {failed} of {total} documents: {reason}")]
    ItemsRejected {
        index: String,
        batch: usize,
        failed: usize,
        total: usize,
        reason: String,
    },

    /// Error reading from object storage.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Malformed storage notification.
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Error from the search cluster outside of bulk submission.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

impl IngestError {
    /// Create a parse error for a 1-based source line.
    pub fn parse(line: usize, source: serde_json::Error) -> Self {
        Self::ParseError { line, source }
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a notification error.
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::NotificationError(msg.into())
    }

    /// Whether the input itself is unusable, so a rerun would fail the same way.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::MissingIdentifier { .. }
            | Self::InvalidIdentifier { .. }
            | Self::ParseError { .. }
            | Self::NotificationError(_) => true,
            Self::SearchError(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Whether a bulk submission failed.
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            Self::SubmissionFailed { .. } | Self::ItemsRejected { .. }
        )
    }
}

impl From<object_store::Error> for IngestError {
    fn from(err: object_store::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}
