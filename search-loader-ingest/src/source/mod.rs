//! Source acquisition for the search loader ingest.
//!
//! Resolves storage notifications into units of work and reads the exported
//! objects they point at.

mod notification;
mod object_reader;

pub use notification::{parse_event, parse_notification, SourceUnit};
pub use object_reader::{ObjectReader, ObjectStoreReader};
