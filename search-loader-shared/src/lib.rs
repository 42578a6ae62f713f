//! # Search Loader Shared
//!
//! Data types shared by the search loader crates: the exported row
//! (`Record`), catalog column metadata, and cluster credentials.

mod column;
mod credentials;
mod record;

pub use column::ColumnMetadata;
pub use credentials::Credentials;
pub use record::{Record, ID_FIELD};
