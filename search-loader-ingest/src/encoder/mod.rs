//! Bulk request encoding.
//!
//! A bulk request body is one action line and one document line per record,
//! each a standalone JSON value, with a newline after every line:
//!
//! ```text
//! {"index": {"_id": "a"}}
//! {"x": true}
//! {"index": {"_id": "b"}}
//! {"x": false}
//! ```

mod canonical;

pub use canonical::{canonical_len, to_canonical_string};

use serde_json::{json, Value};

use crate::errors::IngestError;
use canonical::write_canonical;
use search_loader_shared::Record;

/// One encoded bulk request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    body: String,
    records: usize,
}

impl BulkRequest {
    /// The newline-terminated request body.
    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Size of the body in bytes.
    pub fn len_bytes(&self) -> usize {
        self.body.len()
    }

    /// Number of records (action/document pairs) in the body.
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn into_string(self) -> String {
        self.body
    }
}

/// Document id for the action line.
///
/// Strings pass through, numbers are coerced to their decimal text.
fn document_id(position: usize, id: Option<Value>) -> Result<String, IngestError> {
    match id {
        Some(Value::String(id)) => Ok(id),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(IngestError::InvalidIdentifier {
            position,
            value: other.to_string(),
        }),
        None => Err(IngestError::MissingIdentifier { position }),
    }
}

/// Encode a batch of records as a bulk request body.
///
/// Records are consumed: each one is split into its `_id` (written to the
/// action line) and the remaining fields (written as the document line), so
/// a record cannot be reused after it has been encoded.
///
/// # Errors
///
/// * `IngestError::MissingIdentifier` - a record has no `_id`
/// * `IngestError::InvalidIdentifier` - an `_id` is not a string or number
pub fn encode<I>(batch: I) -> Result<BulkRequest, IngestError>
where
    I: IntoIterator<Item = Record>,
{
    let mut body = Vec::new();
    let mut records = 0;

    for (position, record) in batch.into_iter().enumerate() {
        let (id, document) = record.into_parts();
        let id = document_id(position, id)?;

        write_canonical(&mut body, &json!({ "index": { "_id": id } }))?;
        body.push(b'\n');
        write_canonical(&mut body, &document)?;
        body.push(b'\n');
        records += 1;
    }

    let body = String::from_utf8(body).map_err(|e| {
        IngestError::EncodingError(<serde_json::Error as serde::ser::Error>::custom(e))
    })?;

    Ok(BulkRequest { body, records })
}
