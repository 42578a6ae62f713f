//! Catalog column metadata.

use serde::{Deserialize, Serialize};

/// A column as described by the data catalog.
///
/// Serialized with the catalog's own key casing (`Name`, `Type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}
