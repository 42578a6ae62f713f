//! Storage notification parsing.
//!
//! An object-created notification lists the objects written by the export
//! under a `Records` array. When the notification is delivered through a
//! queue, each queue message carries one notification as a JSON string in
//! its `body`.

use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::errors::IngestError;

/// One exported object: the unit of work of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub bucket: String,
    pub key: String,
}

impl SourceUnit {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Index the object is loaded into.
    ///
    /// The export writes `.../{index_name}/part-*.json`, so the index is the
    /// second-to-last segment of the key.
    pub fn index_name(&self) -> Result<&str, IngestError> {
        self.key
            .rsplit('/')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                IngestError::notification(format!("Key {} does not name an index directory", self.key))
            })
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<EnvelopeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvelopeRecord {
    Queued { body: String },
    Storage { s3: StorageEntity },
}

#[derive(Debug, Deserialize)]
struct StorageEntity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

fn parse_envelope(text: &str) -> Result<Envelope, IngestError> {
    serde_json::from_str(text)
        .map_err(|e| IngestError::notification(format!("Unreadable notification: {}", e)))
}

fn storage_unit(entity: StorageEntity) -> Result<SourceUnit, IngestError> {
    let unit = SourceUnit::new(entity.bucket.name, entity.object.key);
    unit.index_name()?;
    Ok(unit)
}

/// Units of work listed by one storage notification, in listed order.
///
/// A notification without a `Records` array (such as a test event) lists
/// nothing.
pub fn parse_notification(body: &str) -> Result<Vec<SourceUnit>, IngestError> {
    let envelope = parse_envelope(body)?;
    if envelope.records.is_empty() {
        warn!("Notification lists no objects");
    }

    envelope
        .records
        .into_iter()
        .map(|record| match record {
            EnvelopeRecord::Storage { s3 } => storage_unit(s3),
            EnvelopeRecord::Queued { .. } => Err(IngestError::notification(
                "Queue message nested inside a storage notification",
            )),
        })
        .collect()
}

/// Units of work from either a storage notification or a queue event
/// wrapping one or more notifications.
pub fn parse_event(text: &str) -> Result<Vec<SourceUnit>, IngestError> {
    let envelope = parse_envelope(text)?;

    let mut units = Vec::new();
    for record in envelope.records {
        match record {
            EnvelopeRecord::Queued { body } => units.extend(parse_notification(&body)?),
            EnvelopeRecord::Storage { s3 } => units.push(storage_unit(s3)?),
        }
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(keys: &[&str]) -> String {
        let records: Vec<_> = keys
            .iter()
            .map(|key| {
                json!({
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": "exports", "arn": "arn:aws:s3:::exports"},
                        "object": {"key": key, "size": 1024}
                    }
                })
            })
            .collect();
        json!({ "Records": records }).to_string()
    }

    #[test]
    fn test_index_name_is_parent_directory() {
        let unit = SourceUnit::new("exports", "sales/orders/sales_orders_2024-01-09/part-0000.json");
        assert_eq!(unit.index_name().unwrap(), "sales_orders_2024-01-09");
        assert_eq!(
            unit.to_string(),
            "s3://exports/sales/orders/sales_orders_2024-01-09/part-0000.json"
        );
    }

    #[test]
    fn test_index_name_requires_two_segments() {
        assert!(SourceUnit::new("b", "part-0000.json").index_name().is_err());
        assert!(SourceUnit::new("b", "/part-0000.json").index_name().is_err());
        assert_eq!(SourceUnit::new("b", "idx/part.json").index_name().unwrap(), "idx");
    }

    #[test]
    fn test_parse_notification_keeps_order() {
        let body = notification(&["a/idx_one/part-1.json", "a/idx_two/part-2.json"]);

        let units = parse_notification(&body).unwrap();

        assert_eq!(
            units,
            vec![
                SourceUnit::new("exports", "a/idx_one/part-1.json"),
                SourceUnit::new("exports", "a/idx_two/part-2.json"),
            ]
        );
    }

    #[test]
    fn test_parse_notification_rejects_flat_key() {
        let err = parse_notification(&notification(&["part-1.json"])).unwrap_err();
        assert!(matches!(err, IngestError::NotificationError(_)));
    }

    #[test]
    fn test_parse_notification_without_records() {
        let body = json!({"Service": "Amazon S3", "Event": "s3:TestEvent"}).to_string();
        assert!(parse_notification(&body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_notification_rejects_garbage() {
        assert!(matches!(
            parse_notification("not json"),
            Err(IngestError::NotificationError(_))
        ));
    }

    #[test]
    fn test_parse_event_unwraps_queue_messages() {
        let event = json!({
            "Records": [
                {"messageId": "1", "body": notification(&["x/first/p.json"])},
                {"messageId": "2", "body": notification(&["x/second/p.json", "x/third/p.json"])}
            ]
        })
        .to_string();

        let units = parse_event(&event).unwrap();

        let indexes: Vec<&str> = units.iter().map(|u| u.index_name().unwrap()).collect();
        assert_eq!(indexes, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_parse_event_accepts_bare_notification() {
        let units = parse_event(&notification(&["x/idx/p.json"])).unwrap();
        assert_eq!(units, vec![SourceUnit::new("exports", "x/idx/p.json")]);
    }
}
