//! Incremental JSON array writers.
//!
//! [`JsonArrayWriter`] streams one element at a time into a JSON array
//! without holding the array in memory. The layout is:
//!
//! ```text
//! [
//!   {"first":"element"},
//!   {"second":"element"}
//! ]
//! ```
//!
//! An array with no elements is written as `[`, a blank line, and `]`.
//! [`DualJsonSink`] pairs two such writers: one receives every reshaped row,
//! the other only rows that carried additional fields.

use crate::nested::NestedMap;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const OPEN: &[u8] = b"[\n";
const SEPARATOR: &[u8] = b",\n";
const INDENT: &[u8] = b"  ";
const CLOSE: &[u8] = b"\n]";

/// Append-only writer for a single JSON array.
pub struct JsonArrayWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Write the opening bracket to `inner`.
    ///
    /// # Errors
    /// Returns an error if the bracket cannot be written.
    pub fn new(mut inner: W) -> std::io::Result<Self> {
        inner.write_all(OPEN)?;
        Ok(Self { inner, written: 0 })
    }

    /// Serialize `item` as the next element.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    pub fn push<T: Serialize + ?Sized>(&mut self, item: &T) -> std::io::Result<()> {
        if self.written > 0 {
            self.inner.write_all(SEPARATOR)?;
        }
        self.inner.write_all(INDENT)?;
        serde_json::to_writer(&mut self.inner, item)?;
        self.written += 1;
        Ok(())
    }

    /// Elements written so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.written
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Close the array, flush, and hand back the destination.
    ///
    /// # Errors
    /// Returns an error if the closing bracket cannot be written or flushed.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.inner.write_all(CLOSE)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl JsonArrayWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns an error if the directories or the file cannot be created.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

/// Element of the additional-info array.
#[derive(Debug, Serialize)]
pub struct AdditionalInfo<'a> {
    #[serde(rename = "recordIndex")]
    pub record_index: u64,
    pub name: &'a str,
    pub additional_info: &'a NestedMap,
}

/// Where the two artifacts of a run are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub records: PathBuf,
    pub additional_info: PathBuf,
}

impl OutputPaths {
    pub const RECORDS_FILE: &'static str = "output.json";
    pub const ADDITIONAL_INFO_FILE: &'static str = "additional-info.json";

    /// Both artifacts under `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            records: dir.join(Self::RECORDS_FILE),
            additional_info: dir.join(Self::ADDITIONAL_INFO_FILE),
        }
    }

    /// Both artifacts next to `input`.
    #[must_use]
    pub fn beside(input: &Path) -> Self {
        Self::in_dir(input.parent().unwrap_or_else(|| Path::new("")))
    }
}

/// The two output arrays of one run.
pub struct DualJsonSink<W: Write> {
    records: JsonArrayWriter<W>,
    additional: JsonArrayWriter<W>,
}

impl<W: Write> DualJsonSink<W> {
    #[must_use]
    pub fn new(records: JsonArrayWriter<W>, additional: JsonArrayWriter<W>) -> Self {
        Self {
            records,
            additional,
        }
    }

    /// Append a reshaped row to the records array.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn write_record(&mut self, obj: &NestedMap) -> std::io::Result<()> {
        self.records.push(obj)
    }

    /// Append an additional-info entry for the row at `record_index`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn write_additional(
        &mut self,
        record_index: u64,
        name: &str,
        additional_info: &NestedMap,
    ) -> std::io::Result<()> {
        self.additional.push(&AdditionalInfo {
            record_index,
            name,
            additional_info,
        })
    }

    /// Element counts as `(records, additional)`.
    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        (self.records.len(), self.additional.len())
    }

    /// Close both arrays. Both are attempted even if the first fails.
    ///
    /// # Errors
    /// Returns the first error encountered.
    pub fn finish(self) -> std::io::Result<(W, W)> {
        let records = self.records.finish();
        let additional = self.additional.finish();
        Ok((records?, additional?))
    }
}

impl DualJsonSink<BufWriter<File>> {
    /// Create both artifact files.
    ///
    /// # Errors
    /// Returns the path that could not be created along with the cause.
    pub fn create(paths: &OutputPaths) -> Result<Self, (PathBuf, std::io::Error)> {
        let records =
            JsonArrayWriter::create(&paths.records).map_err(|e| (paths.records.clone(), e))?;
        let additional = JsonArrayWriter::create(&paths.additional_info)
            .map_err(|e| (paths.additional_info.clone(), e))?;
        Ok(Self::new(records, additional))
    }
}
