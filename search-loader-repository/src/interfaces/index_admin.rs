//! Index administration trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;

/// Index lifecycle and inspection operations against the search cluster.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create an index with the given settings and mappings body.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index to create
    /// * `body` - Full creation body (`settings` and `mappings`)
    async fn create_index(&self, index: &str, body: Value) -> Result<(), SearchError>;

    /// Delete an index.
    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    /// Number of documents currently searchable in an index.
    async fn document_count(&self, index: &str) -> Result<u64, SearchError>;

    /// Number of cluster nodes carrying the `data` role.
    ///
    /// Used only to size the shard count when an index is created.
    async fn data_node_count(&self) -> Result<usize, SearchError>;
}
