//! Response types for bulk submissions.

/// A single failed action inside an otherwise accepted bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    /// Position of the action within the request body.
    pub position: usize,
    /// HTTP-style status reported for the item.
    pub status: u16,
    /// Failure reason reported by the cluster.
    pub reason: String,
}

/// Outcome of one bulk request as reported by the cluster.
///
/// The transport returns `Err` when the request as a whole is rejected; a
/// request that is accepted may still carry per-item failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    /// Number of actions the cluster reported on.
    pub items: usize,
    /// Actions that failed.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkOutcome {
    /// An outcome where every one of `items` actions succeeded.
    pub fn accepted(items: usize) -> Self {
        Self {
            items,
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
