//! Orchestrator module for the search loader ingest.
//!
//! Runs the units of work named by a storage notification through the
//! ingestion driver, one object after another.

use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::errors::IngestError;
use crate::loader::{IngestSummary, IngestionDriver};
use crate::source::{parse_event, ObjectReader, SourceUnit};

/// Totals for one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Objects fully loaded.
    pub units: usize,
    /// Records indexed across all objects.
    pub records: usize,
    /// Bulk requests submitted across all objects.
    pub batches: usize,
}

impl RunSummary {
    fn add(&mut self, unit: &IngestSummary) {
        self.units += 1;
        self.records += unit.records;
        self.batches += unit.batches;
    }
}

/// Loads exported objects into their indexes.
///
/// Units are processed in the order they are listed. The first failing unit
/// ends the invocation; units after it are not read.
pub struct UnitProcessor {
    reader: Arc<dyn ObjectReader>,
    driver: IngestionDriver,
}

impl UnitProcessor {
    pub fn new(reader: Arc<dyn ObjectReader>, driver: IngestionDriver) -> Self {
        Self { reader, driver }
    }

    /// Load one object.
    ///
    /// The target index is `index` when given, otherwise the one named by the
    /// object's key.
    #[instrument(skip(self, unit), fields(unit = %unit))]
    pub async fn process_object(
        &self,
        unit: &SourceUnit,
        index: Option<&str>,
    ) -> Result<IngestSummary, IngestError> {
        self.load(unit, index).await.inspect_err(|e| {
            error!(error = %e, "Error processing {}", unit);
        })
    }

    async fn load(&self, unit: &SourceUnit, index: Option<&str>) -> Result<IngestSummary, IngestError> {
        let index = match index {
            Some(index) => index,
            None => unit.index_name()?,
        };

        info!(index = %index, "Processing object");
        let content = self.reader.read_to_string(&unit.bucket, &unit.key).await?;
        self.driver.run(content.lines(), index).await
    }

    /// Load every object named by a notification or queue event.
    #[instrument(skip(self, body))]
    pub async fn process_notification(&self, body: &str) -> Result<RunSummary, IngestError> {
        let units = parse_event(body).inspect_err(|e| {
            error!(error = %e, "Failed to parse notification");
        })?;
        self.process_units(&units).await
    }

    /// Load the given objects in order.
    pub async fn process_units(&self, units: &[SourceUnit]) -> Result<RunSummary, IngestError> {
        let mut summary = RunSummary::default();
        for unit in units {
            let loaded = self.process_object(unit, None).await?;
            summary.add(&loaded);
        }

        info!(
            units = summary.units,
            records = summary.records,
            batches = summary.batches,
            "Finished processing notification"
        );
        Ok(summary)
    }
}
