//! Interface definitions for the search cluster.
//!
//! This module defines the abstract traits the loader consumes, allowing
//! dependency injection and swappable backends (OpenSearch, mocks in tests).

mod bulk_submitter;
mod index_admin;

pub use bulk_submitter::BulkSubmitter;
pub use index_admin::IndexAdmin;
