//! OpenSearch index settings and mappings.
//!
//! This module translates catalog column metadata into index field types and
//! builds the creation body for a daily index.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::errors::SearchError;
use search_loader_shared::ColumnMetadata;

/// Accepted input formats for `date` fields.
pub const DATE_FORMAT: &str =
    "yyyy-MM-dd HH:mm:ss.SSSSSS||yyyy-MM-dd HH:mm:ss||strict_date_optional_time||epoch_millis";

/// Columns mapped as dates regardless of their catalog type.
const DATE_COLUMN_NAMES: &[&str] = &["run_date", "snapshot_day", "snapshot_date"];

const DATE_TYPES: &[&str] = &["date", "timestamp with time zone", "timestamp"];
const KEYWORD_TYPES: &[&str] = &["char", "varchar", "array", "map", "string"];
const INTEGER_TYPES: &[&str] = &["int", "tinyint", "smallint", "integer"];
const LONG_TYPES: &[&str] = &["bigint"];
const DOUBLE_TYPES: &[&str] = &["double", "decimal", "real", "float"];

/// Shard and replica layout for a new index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSettings {
    pub shards: usize,
    pub replicas: usize,
}

impl IndexSettings {
    /// One primary shard per data node, never fewer than one.
    pub fn for_data_nodes(data_nodes: usize, replicas: usize) -> Self {
        Self {
            shards: data_nodes.max(1),
            replicas,
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            shards: 1,
            replicas: 1,
        }
    }
}

/// Name of the daily index for a catalog table: `{schema}_{table}_{YYYY-MM-DD}`.
pub fn index_name_for(schema: &str, table: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}", schema, table, date.format("%Y-%m-%d"))
}

/// Index field type for a single catalog column.
///
/// Name-based date detection wins over the declared type.
fn field_type(column: &ColumnMetadata) -> Result<&'static str, SearchError> {
    let declared = column.column_type.as_str();

    if DATE_TYPES.contains(&declared) || DATE_COLUMN_NAMES.contains(&column.name.as_str()) {
        Ok("date")
    } else if KEYWORD_TYPES.contains(&declared) {
        Ok("keyword")
    } else if INTEGER_TYPES.contains(&declared) {
        Ok("integer")
    } else if LONG_TYPES.contains(&declared) {
        Ok("long")
    } else if DOUBLE_TYPES.contains(&declared) || declared.contains("decimal") {
        Ok("double")
    } else if declared == "boolean" {
        Ok("boolean")
    } else {
        Err(SearchError::unsupported_column_type(
            &column.name,
            &column.column_type,
        ))
    }
}

/// Build the `properties` mapping for a table's columns.
///
/// # Errors
///
/// Returns `SearchError::UnsupportedColumnType` for the first column whose
/// type cannot be mapped. No partial mapping is returned.
pub fn build_field_mappings(columns: &[ColumnMetadata]) -> Result<Map<String, Value>, SearchError> {
    let mut properties = Map::with_capacity(columns.len());

    for column in columns {
        let data_type = field_type(column)?;
        let mapping = if data_type == "date" {
            json!({ "type": data_type, "format": DATE_FORMAT })
        } else {
            json!({ "type": data_type })
        };
        properties.insert(column.name.clone(), mapping);
    }

    Ok(properties)
}

/// Full index creation body: settings plus field mappings.
pub fn build_index_body(properties: Map<String, Value>, settings: IndexSettings) -> Value {
    json!({
        "settings": {
            "index": {
                "number_of_shards": settings.shards,
                "number_of_replicas": settings.replicas,
                "codec": "best_compression"
            }
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: &str) -> ColumnMetadata {
        ColumnMetadata::new(name, column_type)
    }

    #[test]
    fn test_field_type_classification() {
        let cases = [
            ("timestamp", "date"),
            ("timestamp with time zone", "date"),
            ("date", "date"),
            ("varchar", "keyword"),
            ("array", "keyword"),
            ("map", "keyword"),
            ("tinyint", "integer"),
            ("int", "integer"),
            ("bigint", "long"),
            ("float", "double"),
            ("decimal(10,2)", "double"),
            ("boolean", "boolean"),
        ];

        for (declared, expected) in cases {
            assert_eq!(
                field_type(&column("c", declared)).unwrap(),
                expected,
                "type {declared}"
            );
        }
    }

    #[test]
    fn test_date_column_names_override_declared_type() {
        assert_eq!(field_type(&column("snapshot_day", "string")).unwrap(), "date");
        assert_eq!(field_type(&column("run_date", "varchar")).unwrap(), "date");
    }

    #[test]
    fn test_build_field_mappings() {
        let columns = vec![
            column("id", "bigint"),
            column("title", "string"),
            column("updated_at", "timestamp"),
        ];

        let properties = build_field_mappings(&columns).unwrap();

        assert_eq!(properties["id"], json!({"type": "long"}));
        assert_eq!(properties["title"], json!({"type": "keyword"}));
        assert_eq!(properties["updated_at"]["type"], "date");
        assert_eq!(properties["updated_at"]["format"], DATE_FORMAT);
    }

    #[test]
    fn test_unknown_column_type_is_fatal() {
        let columns = vec![column("id", "bigint"), column("blob", "binary")];

        let err = build_field_mappings(&columns).unwrap_err();

        assert!(err.is_configuration());
        assert!(matches!(
            err,
            SearchError::UnsupportedColumnType { ref column, ref column_type }
                if column == "blob" && column_type == "binary"
        ));
    }

    #[test]
    fn test_index_body_structure() {
        let properties = build_field_mappings(&[column("flag", "boolean")]).unwrap();
        let body = build_index_body(properties, IndexSettings::for_data_nodes(3, 1));

        assert_eq!(body["settings"]["index"]["number_of_shards"], 3);
        assert_eq!(body["settings"]["index"]["number_of_replicas"], 1);
        assert_eq!(body["settings"]["index"]["codec"], "best_compression");
        assert_eq!(body["mappings"]["properties"]["flag"]["type"], "boolean");
    }

    #[test]
    fn test_shards_never_below_one() {
        assert_eq!(IndexSettings::for_data_nodes(0, 1).shards, 1);
    }

    #[test]
    fn test_index_name_for() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(index_name_for("sales", "orders", date), "sales_orders_2024-01-09");
    }
}
