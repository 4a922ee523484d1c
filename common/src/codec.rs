//! Record encoding shared by intermediate partition files and reduce
//! output files.
//!
//! Records are written as one JSON object per line. The stream is
//! self-describing, so readers need no length prefix and an empty file is a
//! valid, empty stream.

use std::io::{Read, Write};

use anyhow::{Context, Result};

use crate::KeyValue;

/// Append a single record to `writer`.
pub fn write_record<W: Write>(writer: &mut W, kv: &KeyValue) -> Result<()> {
    serde_json::to_writer(&mut *writer, kv).context("failed to encode record")?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write every record of `records` to `writer`, in order.
pub fn write_records<'a, W, I>(writer: &mut W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a KeyValue>,
{
    for kv in records {
        write_record(writer, kv)?;
    }
    Ok(())
}

/// Lazily decode the records of `reader`.
///
/// A malformed record yields an error; the caller decides whether that is
/// fatal.
pub fn read_records<R: Read>(reader: R) -> impl Iterator<Item = Result<KeyValue>> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<KeyValue>()
        .map(|res| res.context("malformed record"))
}
