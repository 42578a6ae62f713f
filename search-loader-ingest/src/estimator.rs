//! Batch size estimation.
//!
//! Records arrive with no size information, so the number of records that fit
//! in one bulk request is derived from a sample: the mean canonical size of
//! the sampled records plus the size of a worst-case action line, divided
//! into a fraction of the byte ceiling.

use tracing::{debug, info, warn};

use crate::encoder::canonical_len;
use crate::errors::IngestError;
use search_loader_shared::Record;

/// A maximal action line with the two newlines that frame a record.
///
/// Identifiers are at most as long as a UUID, so every record's framing costs
/// no more than this.
pub const ACTION_OVERHEAD_SAMPLE: &str =
    "{\"index\": {\"_id\": 12345678-1234-1234-1234-123456789012}}\n\n";

/// Default byte ceiling when the caller does not override it.
pub const DEFAULT_CEILING_BYTES: usize = 10_485_760;

/// Default share of the ceiling available to records.
pub const DEFAULT_BUDGET_FRACTION: f64 = 0.8;

/// Default minimum sample length for a computed estimate.
pub const DEFAULT_MIN_SAMPLE: usize = 100;

/// Configuration for the batch size estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Ceiling used by `estimate_default`.
    pub ceiling_bytes: usize,
    /// Fraction of the ceiling that records may use; the rest is headroom
    /// for transport overhead and estimation error.
    pub budget_fraction: f64,
    /// Samples shorter than this are not trusted; the batch size falls back
    /// to this value.
    pub min_sample: usize,
    /// Per-record framing cost in bytes.
    pub overhead_bytes: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: DEFAULT_CEILING_BYTES,
            budget_fraction: DEFAULT_BUDGET_FRACTION,
            min_sample: DEFAULT_MIN_SAMPLE,
            overhead_bytes: ACTION_OVERHEAD_SAMPLE.len(),
        }
    }
}

/// Estimates how many records fit in one bulk request.
#[derive(Debug, Clone, Default)]
pub struct BatchSizeEstimator {
    config: EstimatorConfig,
}

impl BatchSizeEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate against the configured default ceiling.
    pub fn estimate_default(&self, sample: &[Record]) -> Result<usize, IngestError> {
        self.estimate(sample, self.config.ceiling_bytes)
    }

    /// Number of records per bulk request for records like `sample`.
    ///
    /// `round(ceiling * budget_fraction / (mean_record_bytes + overhead_bytes))`,
    /// with ties rounded to even. A sample shorter than `min_sample` yields
    /// `min_sample` itself. The result is never below 1: an estimate that
    /// rounds to zero (records larger than the whole budget) is clamped to
    /// one record per request.
    pub fn estimate(&self, sample: &[Record], ceiling_bytes: usize) -> Result<usize, IngestError> {
        if sample.is_empty() || sample.len() < self.config.min_sample {
            let fallback = self.config.min_sample.max(1);
            debug!(
                sample = sample.len(),
                min_sample = self.config.min_sample,
                batch_size = fallback,
                "Sample too small, using default batch size"
            );
            return Ok(fallback);
        }

        let mut total_bytes = 0usize;
        for record in sample {
            total_bytes += canonical_len(record)?;
        }

        let mean_bytes = total_bytes as f64 / sample.len() as f64;
        let per_record = mean_bytes + self.config.overhead_bytes as f64;
        let budget = ceiling_bytes as f64 * self.config.budget_fraction;
        let estimate = (budget / per_record).round_ties_even();

        let batch_size = if estimate < 1.0 {
            warn!(
                mean_record_bytes = mean_bytes,
                ceiling_bytes,
                "Records exceed the request budget, submitting one record per request"
            );
            1
        } else {
            estimate as usize
        };

        info!(
            sample = sample.len(),
            mean_record_bytes = mean_bytes,
            ceiling_bytes,
            batch_size,
            "Estimated batch size"
        );
        Ok(batch_size)
    }
}
