//! Input fixtures and output readers.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A people file laid out in a temporary directory.
///
/// The directory, and the outputs a run writes next to the input, are
/// removed when the fixture is dropped.
pub struct CsvFixture {
    dir: TempDir,
    file_name: String,
    lines: Vec<String>,
}

impl CsvFixture {
    /// Start a fixture whose first line is `header`.
    ///
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new(header: &str) -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            file_name: "data.csv".to_string(),
            lines: vec![header.to_string()],
        })
    }

    /// Name the input file (e.g. `people.csv.gz`).
    #[must_use]
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// Append a raw line.
    #[must_use]
    pub fn row(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Append many raw lines.
    #[must_use]
    pub fn rows<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Write the lines, newline-terminated, to the input file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write(self) -> std::io::Result<Self> {
        let mut body = self.lines.join("\n");
        body.push('\n');
        self.write_bytes(body.as_bytes())?;
        Ok(self)
    }

    /// Write arbitrary bytes as the input file, ignoring the collected lines.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(self.input())?;
        file.write_all(bytes)?;
        file.flush()
    }

    /// The collected lines joined as file content.
    #[must_use]
    pub fn content(&self) -> String {
        let mut body = self.lines.join("\n");
        body.push('\n');
        body
    }

    #[must_use]
    pub fn input(&self) -> PathBuf {
        self.dir.path().join(&self.file_name)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Parse a JSON array artifact into its elements.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a JSON array.
pub fn read_json_array(path: impl AsRef<Path>) -> anyhow::Result<Vec<serde_json::Value>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_reader(BufReader::new(file))?;
    Ok(values)
}
