//! Row reshaping: flat values plus dotted-path headers into a [`NestedMap`].

use crate::nested::{set_path, NestedMap};
use crate::tokenizer::tokenize;

/// One header column, split once into its path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    segments: Vec<String>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let segments = name.split('.').map(str::to_string).collect();
        Self { name, segments }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// The ordered dotted-path columns of one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    columns: Vec<Column>,
}

impl Header {
    /// Tokenize a header line and trim every column name.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        tokenize(line).iter().map(|c| c.trim()).collect()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Header {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(Column::new).collect(),
        }
    }
}

/// Tokenize a data line into trimmed values.
#[must_use]
pub fn split_row(line: &str) -> Vec<String> {
    tokenize(line)
        .into_iter()
        .map(|v| v.trim().to_string())
        .collect()
}

/// Build the nested object for one row.
///
/// Columns whose value is missing (short row) or blank are skipped, so no key
/// is created for them. Values beyond the header are ignored. Values are kept
/// as trimmed strings; typing happens during extraction.
///
/// # Example
/// ```
/// use rowbeam::{reshape, Header};
///
/// let header: Header = ["name.firstName", "name.lastName", "age"].into_iter().collect();
/// let obj = reshape(&header, &["Jane", "Doe", "30"]);
/// assert_eq!(
///     serde_json::to_string(&obj).unwrap(),
///     r#"{"name":{"firstName":"Jane","lastName":"Doe"},"age":"30"}"#
/// );
/// ```
#[must_use]
pub fn reshape<V: AsRef<str>>(header: &Header, row: &[V]) -> NestedMap {
    let mut obj = NestedMap::new();
    for (column, value) in header.columns.iter().zip(row) {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        let path: Vec<&str> = column.segments.iter().map(String::as_str).collect();
        set_path(&mut obj, &path, value);
    }
    obj
}
