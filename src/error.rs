//! Run-level error taxonomy.
//!
//! Only failures that abort a run live here. A row that fails its
//! mandatory-field checks is a [`ValidationError`](crate::validation::ValidationError)
//! and never leaves the per-row step.

use crate::config::ConfigError;
use crate::storage::StorageError;
use std::path::Path;
use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The input could not be opened or read, or an output could not be written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// A storage call failed; remaining batches were not attempted.
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IngestError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for an IO failure tied to a file.
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("{action} {}", path.display()), source)
    }
}
