//! Loader module for the search loader ingest.
//!
//! Drives the records of one unit of work through batching and encoding and
//! submits the resulting bulk requests to the index.

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::batcher::StreamBatcher;
use crate::encoder::encode;
use crate::errors::IngestError;
use crate::estimator::BatchSizeEstimator;
use search_loader_repository::BulkSubmitter;
use search_loader_shared::Record;

/// Default byte ceiling for one bulk request.
pub const DEFAULT_SUBMISSION_CEILING_BYTES: usize = 52_428_800;

/// Default number of leading records used to estimate the batch size.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Configuration for the ingestion driver.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum serialized size of one bulk request.
    pub ceiling_bytes: usize,
    /// Number of leading records sampled for the estimate.
    pub sample_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: DEFAULT_SUBMISSION_CEILING_BYTES,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// What one completed unit of work sent to the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records indexed.
    pub records: usize,
    /// Bulk requests submitted.
    pub batches: usize,
    /// Total bulk body bytes submitted.
    pub bytes: usize,
    /// Records per batch used for this unit.
    pub batch_size: usize,
}

/// Submits the records of one unit of work to an index, one batch at a time.
///
/// The driver is responsible for:
/// - Parsing source lines into records
/// - Sizing batches from a sample of the unit
/// - Submitting batches strictly in order, awaiting each response
///
/// Any failure aborts the rest of the unit. Nothing is retried here and no
/// partial progress is recorded: the caller reruns the whole unit, which is
/// safe because documents are upserted by id.
pub struct IngestionDriver {
    client: Arc<dyn BulkSubmitter>,
    estimator: BatchSizeEstimator,
    config: LoaderConfig,
}

impl IngestionDriver {
    /// Create a new driver with the given client and default configuration.
    pub fn new(client: Arc<dyn BulkSubmitter>) -> Self {
        Self {
            client,
            estimator: BatchSizeEstimator::default(),
            config: LoaderConfig::default(),
        }
    }

    /// Create a new driver with custom configuration.
    pub fn with_config(
        client: Arc<dyn BulkSubmitter>,
        estimator: BatchSizeEstimator,
        config: LoaderConfig,
    ) -> Self {
        Self {
            client,
            estimator,
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load newline-delimited JSON lines into `index`.
    ///
    /// Blank lines are skipped. Each other line must be a JSON object with an
    /// `_id` field.
    ///
    /// # Returns
    ///
    /// * `Ok(IngestSummary)` - Every batch was accepted
    /// * `Err(IngestError)` - The first failure; later batches were not sent
    #[instrument(skip(self, lines))]
    pub async fn run<I, S>(&self, lines: I, index: &str) -> Result<IngestSummary, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = lines
            .into_iter()
            .enumerate()
            .filter_map(|(number, line)| {
                let text: &str = line.as_ref();
                if text.trim().is_empty() {
                    return None;
                }
                Some(Record::from_json_line(text).map_err(|e| IngestError::parse(number + 1, e)))
            });

        self.run_records(records, index).await
    }

    /// Load an already parsed record stream into `index`.
    pub async fn run_records<I>(&self, records: I, index: &str) -> Result<IngestSummary, IngestError>
    where
        I: Iterator<Item = Result<Record, IngestError>>,
    {
        let batcher = StreamBatcher::new(
            records,
            &self.estimator,
            self.config.sample_size,
            self.config.ceiling_bytes,
        )?;

        let mut summary = IngestSummary {
            batch_size: batcher.batch_size(),
            ..IngestSummary::default()
        };
        info!(index = %index, batch_size = summary.batch_size, "Loading records");

        for (position, batch) in batcher.enumerate() {
            let batch_number = position + 1;
            let request = batch.and_then(encode).inspect_err(|e| {
                error!(index = %index, batch = batch_number, error = %e, "Failed to prepare batch");
            })?;

            debug!(
                index = %index,
                batch = batch_number,
                records = request.record_count(),
                bytes = request.len_bytes(),
                "Submitting bulk request"
            );

            let outcome = self
                .client
                .submit(index, request.as_str())
                .await
                .map_err(|source| IngestError::SubmissionFailed {
                    index: index.to_string(),
                    batch: batch_number,
                    source,
                })
                .inspect_err(|e| error!(error = %e, "Bulk submission failed"))?;

            if !outcome.is_success() {
                let reason = outcome
                    .failures
                    .first()
                    .map(|f| f.reason.clone())
                    .unwrap_or_default();
                let err = IngestError::ItemsRejected {
                    index: index.to_string(),
                    batch: batch_number,
                    failed: outcome.failed(),
                    total: request.record_count(),
                    reason,
                };
                error!(error = %err, "Bulk submission rejected documents");
                return Err(err);
            }

            summary.records += request.record_count();
            summary.bytes += request.len_bytes();
            summary.batches += 1;
        }

        info!(
            index = %index,
            records = summary.records,
            batches = summary.batches,
            bytes = summary.bytes,
            "Finished loading records"
        );
        Ok(summary)
    }
}
