//! # Search Loader Ingest
//!
//! This crate bulk-loads exported newline-delimited JSON rows into a search
//! index, sizing every bulk request to stay under a byte ceiling.
//!
//! ## Architecture
//!
//! 1. **Estimator**: derives a records-per-request count from a sample
//! 2. **Encoder**: frames a batch as bulk action/document line pairs
//! 3. **Batcher**: partitions the record stream into fixed-size batches
//! 4. **Loader**: submits the batches of one source object in order
//! 5. **Orchestrator**: resolves storage notifications into units of work

pub mod batcher;
pub mod encoder;
pub mod errors;
pub mod estimator;
pub mod loader;
pub mod orchestrator;
pub mod source;

pub use batcher::StreamBatcher;
pub use encoder::{encode, BulkRequest};
pub use errors::IngestError;
pub use estimator::{BatchSizeEstimator, EstimatorConfig};
pub use loader::{IngestSummary, IngestionDriver, LoaderConfig};
pub use orchestrator::{RunSummary, UnitProcessor};
pub use source::{parse_event, parse_notification, ObjectReader, ObjectStoreReader, SourceUnit};
