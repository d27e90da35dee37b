//! The storage seam.
//!
//! [`UserStore`] is what the pipeline writes accepted records through. The
//! interface is synchronous; implementations that talk to an async driver
//! drive it internally.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process table, used by tests and local tooling
//! - [`DryRunStore`]: logs what would be written and persists nothing
//! - [`PostgresStore`](postgres::PostgresStore): the `public.users` table via
//!   `sqlx` (feature `postgres`)

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{DryRunStore, MemoryStore, StoredUser};

use crate::extract::CanonicalRecord;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Connection,
    Schema,
    Insert,
    Query,
    Internal,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageErrorKind::Connection => "connection",
            StorageErrorKind::Schema => "schema",
            StorageErrorKind::Insert => "insert",
            StorageErrorKind::Query => "query",
            StorageErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// A failed storage call. Always fatal to the run that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage {kind} error: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for accepted person records.
///
/// Table shape: `id` auto-increment key, `name` text, `age` integer,
/// `address` nullable JSON, `additional_info` nullable JSON.
pub trait UserStore: Send + Sync {
    /// Create the target table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the table cannot be created or the backend is unreachable.
    fn ensure_schema(&self) -> StorageResult<()>;

    /// Persist `records` in order as one operation. Returns the number of rows written.
    ///
    /// # Errors
    /// Returns an error on connectivity or constraint failures. Nothing from
    /// the batch is guaranteed to be stored in that case.
    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64>;

    /// Every stored age.
    ///
    /// # Errors
    /// Returns an error if the table cannot be read.
    fn read_all_ages(&self) -> StorageResult<Vec<i32>>;

    /// Release backend resources.
    ///
    /// # Errors
    /// Returns an error if shutdown fails.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl<S: UserStore + ?Sized> UserStore for &S {
    fn ensure_schema(&self) -> StorageResult<()> {
        (**self).ensure_schema()
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        (**self).insert_batch(records)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        (**self).read_all_ages()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}

impl<S: UserStore + ?Sized> UserStore for Box<S> {
    fn ensure_schema(&self) -> StorageResult<()> {
        (**self).ensure_schema()
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        (**self).insert_batch(records)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        (**self).read_all_ages()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}
