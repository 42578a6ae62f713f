//! Table column lookup in the data catalog.

use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::types::{Column, Table};
use aws_sdk_glue::Client as GlueClient;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::LoaderError;
use search_loader_shared::ColumnMetadata;

/// Source of a table's column metadata.
#[async_trait]
pub trait ColumnSource: Send + Sync {
    /// Columns of `schema.table`: data columns followed by partition keys.
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>, LoaderError>;
}

#[derive(Debug, Deserialize)]
struct GetTableResponse {
    #[serde(rename = "Table")]
    table: TableDefinition,
}

#[derive(Debug, Deserialize)]
struct TableDefinition {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "DatabaseName", default)]
    database_name: Option<String>,
    #[serde(rename = "StorageDescriptor")]
    storage_descriptor: StorageDescriptor,
    #[serde(rename = "PartitionKeys", default)]
    partition_keys: Vec<ColumnMetadata>,
}

#[derive(Debug, Deserialize)]
struct StorageDescriptor {
    #[serde(rename = "Columns", default)]
    columns: Vec<ColumnMetadata>,
}

/// Reads columns from a saved catalog `GetTable` response.
#[derive(Debug, Clone)]
pub struct GlueTableFile {
    path: PathBuf,
}

impl GlueTableFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Columns from a `GetTable` JSON document.
    ///
    /// A document naming a different database or table is rejected.
    pub fn parse(document: &str, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>, LoaderError> {
        let response: GetTableResponse = serde_json::from_str(document)
            .map_err(|e| LoaderError::catalog(format!("Unreadable table definition: {}", e)))?;
        let definition = response.table;

        check_table_name(
            definition.database_name.as_deref(),
            definition.name.as_deref(),
            schema,
            table,
        )?;
        Ok(with_partition_keys(
            definition.storage_descriptor.columns,
            definition.partition_keys,
            schema,
            table,
        ))
    }
}

#[async_trait]
impl ColumnSource for GlueTableFile {
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>, LoaderError> {
        let document = tokio::fs::read_to_string(&self.path).await?;
        let columns = Self::parse(&document, schema, table)?;

        debug!(
            path = %self.path.display(),
            columns = columns.len(),
            "Read table definition"
        );
        Ok(columns)
    }
}

/// Reject a definition that names a different database or table.
fn check_table_name(
    database_name: Option<&str>,
    name: Option<&str>,
    schema: &str,
    table: &str,
) -> Result<(), LoaderError> {
    let names_match =
        database_name.map_or(true, |d| d == schema) && name.map_or(true, |n| n == table);
    if names_match {
        return Ok(());
    }
    Err(LoaderError::catalog(format!(
        "Table definition describes {}.{}, expected {}.{}",
        database_name.unwrap_or_default(),
        name.unwrap_or_default(),
        schema,
        table
    )))
}

fn with_partition_keys(
    mut columns: Vec<ColumnMetadata>,
    partition_keys: Vec<ColumnMetadata>,
    schema: &str,
    table: &str,
) -> Vec<ColumnMetadata> {
    columns.extend(partition_keys);
    if columns.is_empty() {
        warn!(schema = %schema, table = %table, "Table definition has no columns");
    }
    columns
}

/// Reads columns live from the Glue data catalog.
#[derive(Debug, Clone)]
pub struct GlueCatalog {
    client: GlueClient,
    /// Account owning the catalog; the caller's account when unset.
    catalog_id: Option<String>,
}

impl GlueCatalog {
    /// Catalog client from the default AWS configuration chain.
    pub async fn new(region: Option<String>, catalog_id: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self::from_client(GlueClient::new(&sdk_config), catalog_id)
    }

    pub fn from_client(client: GlueClient, catalog_id: Option<String>) -> Self {
        Self { client, catalog_id }
    }

    /// Columns of a `GetTable` result: data columns followed by partition keys.
    pub fn table_columns(
        definition: &Table,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnMetadata>, LoaderError> {
        check_table_name(definition.database_name(), Some(definition.name()), schema, table)?;

        let columns = definition
            .storage_descriptor()
            .map(|descriptor| descriptor.columns())
            .unwrap_or_default();
        Ok(with_partition_keys(
            columns.iter().map(column_metadata).collect::<Result<_, _>>()?,
            definition
                .partition_keys()
                .iter()
                .map(column_metadata)
                .collect::<Result<_, _>>()?,
            schema,
            table,
        ))
    }
}

fn column_metadata(column: &Column) -> Result<ColumnMetadata, LoaderError> {
    let column_type = column.r#type().ok_or_else(|| {
        LoaderError::catalog(format!("Column {} has no type", column.name()))
    })?;
    Ok(ColumnMetadata::new(column.name(), column_type))
}

#[async_trait]
impl ColumnSource for GlueCatalog {
    #[instrument(skip(self), fields(catalog_id = ?self.catalog_id))]
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>, LoaderError> {
        let output = self
            .client
            .get_table()
            .set_catalog_id(self.catalog_id.clone())
            .database_name(schema)
            .name(table)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|service| service.is_entity_not_found_exception())
                {
                    LoaderError::catalog(format!("Table {}.{} not found in the catalog", schema, table))
                } else {
                    LoaderError::catalog(format!(
                        "GetTable failed for {}.{}: {}",
                        schema,
                        table,
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let definition = output.table().ok_or_else(|| {
            LoaderError::catalog(format!("GetTable returned no table for {}.{}", schema, table))
        })?;
        let columns = Self::table_columns(definition, schema, table)?;

        debug!(columns = columns.len(), "Fetched table definition");
        Ok(columns)
    }
}
