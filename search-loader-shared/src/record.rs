//! Exported table rows.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the document identifier in every exported row.
pub const ID_FIELD: &str = "_id";

/// One exported row: a JSON object keyed by column name.
///
/// Field order follows the source line. The `_id` field is metadata used as
/// the bulk action's document id; it is removed before the row is sent as a
/// document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parse one line of newline-delimited JSON.
    ///
    /// Anything other than a JSON object is rejected.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Add a field, replacing any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Add a field holding the string form of a non-JSON value (dates, decimals).
    pub fn insert_display(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.insert(key.into(), Value::String(value.to_string()));
    }

    /// The raw `_id` value, if present.
    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the row into its raw `_id` value and the remaining document.
    pub fn into_parts(self) -> (Option<Value>, Map<String, Value>) {
        let mut id = None;
        let mut document = Map::with_capacity(self.0.len());
        for (key, value) in self.0 {
            if key == ID_FIELD {
                id = Some(value);
            } else {
                document.insert(key, value);
            }
        }
        (id, document)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_from_json_line_keeps_field_order() {
        let record = Record::from_json_line(r#"{"b":1,"_id":"x","a":true}"#).unwrap();

        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "_id", "a"]);
        assert_eq!(record.id(), Some(&json!("x")));
    }

    #[test]
    fn test_from_json_line_rejects_non_objects() {
        assert!(Record::from_json_line("[1, 2]").is_err());
        assert!(Record::from_json_line("\"text\"").is_err());
        assert!(Record::from_json_line("{not json").is_err());
    }

    #[test]
    fn test_into_parts_strips_identifier() {
        let record = Record::default()
            .with_field("_id", "a")
            .with_field("name", "row")
            .with_field("active", false);

        let (id, document) = record.into_parts();

        assert_eq!(id, Some(json!("a")));
        assert_eq!(Value::Object(document), json!({"name": "row", "active": false}));
    }

    #[test]
    fn test_insert_display_uses_string_form() {
        let mut record = Record::default();
        record.insert_display("snapshot_day", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        assert_eq!(record.fields()["snapshot_day"], json!("2024-03-01"));
    }
}
