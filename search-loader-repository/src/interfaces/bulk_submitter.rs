//! Bulk submission trait definition.

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::BulkOutcome;

/// Transport for encoded bulk requests.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single client handle can be
/// shared by the driver and the index preparation job.
#[async_trait]
pub trait BulkSubmitter: Send + Sync {
    /// Submit one encoded bulk request to an index.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the target index
    /// * `body` - Newline-delimited action/document pairs, newline-terminated
    ///
    /// # Returns
    ///
    /// * `Ok(BulkOutcome)` - The request was accepted; per-item failures, if
    ///   any, are listed in the outcome
    /// * `Err(SearchError)` - The request could not be sent or was rejected
    async fn submit(&self, index: &str, body: &str) -> Result<BulkOutcome, SearchError>;
}
