//! Daily index preparation.
//!
//! Before an export is loaded, its index is recreated from the catalog
//! definition of the table. After the load, the job waits until every
//! exported row is searchable.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::catalog::ColumnSource;
use crate::LoaderError;
use search_loader_repository::{
    build_field_mappings, build_index_body, index_name_for, IndexAdmin, IndexSettings,
};

/// Recreates daily indexes and tracks their document counts.
pub struct IndexPreparer {
    admin: Arc<dyn IndexAdmin>,
    replicas: usize,
    poll_interval: Duration,
}

impl IndexPreparer {
    pub fn new(admin: Arc<dyn IndexAdmin>, replicas: usize, poll_interval: Duration) -> Self {
        Self {
            admin,
            replicas,
            poll_interval,
        }
    }

    /// Recreate the index for `schema.table` on `date` and return its name.
    ///
    /// Field types come from the table's columns in `catalog`. Any existing
    /// index of the same name is deleted first, so rerunning a day starts
    /// from an empty index.
    #[instrument(skip(self, catalog))]
    pub async fn prepare(
        &self,
        catalog: &dyn ColumnSource,
        schema: &str,
        table: &str,
        date: NaiveDate,
    ) -> Result<String, LoaderError> {
        let index = index_name_for(schema, table, date);

        let data_nodes = self.admin.data_node_count().await?;
        let settings = IndexSettings::for_data_nodes(data_nodes, self.replicas);

        if self.admin.index_exists(&index).await? {
            info!(index = %index, "Deleting existing index");
            self.admin.delete_index(&index).await?;
        }

        let columns = catalog.columns(schema, table).await?;
        let properties = build_field_mappings(&columns)?;
        let body = build_index_body(properties, settings);

        self.admin.create_index(&index, body).await?;
        info!(
            index = %index,
            shards = settings.shards,
            replicas = settings.replicas,
            fields = columns.len(),
            "Prepared index"
        );
        Ok(index)
    }

    /// Wait until `index` holds at least `expected` documents.
    ///
    /// Polls without a deadline; the caller bounds the job.
    #[instrument(skip(self))]
    pub async fn wait_for_documents(&self, index: &str, expected: u64) -> Result<u64, LoaderError> {
        loop {
            let count = self.admin.document_count(index).await?;
            if count >= expected {
                info!(index = %index, count, "All documents indexed");
                return Ok(count);
            }

            info!(index = %index, count, expected, "Waiting for documents");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
