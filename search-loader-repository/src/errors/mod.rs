//! Error types for the search loader repository.

mod search_error;

pub use search_error::SearchError;
