//! Canonical JSON text for bulk lines and size estimates.
//!
//! Objects and arrays are written on one line with `", "` between items and
//! `": "` between keys and values. The estimator measures records with the
//! same encoding the encoder sends, so estimates track the real payload.

use std::io;

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

/// Single-line formatter with a space after every separator.
#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Append the canonical encoding of `value` to `buf`.
pub(crate) fn write_canonical<T>(buf: &mut Vec<u8>, value: &T) -> Result<(), serde_json::Error>
where
    T: ?Sized + Serialize,
{
    let mut serializer = Serializer::with_formatter(buf, SpacedFormatter);
    value.serialize(&mut serializer)
}

/// Canonical encoding of `value` as a string.
pub fn to_canonical_string<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::with_capacity(128);
    write_canonical(&mut buf, value)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}

/// UTF-8 byte length of the canonical encoding of `value`.
pub fn canonical_len<T>(value: &T) -> Result<usize, serde_json::Error>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::with_capacity(128);
    write_canonical(&mut buf, value)?;
    Ok(buf.len())
}
