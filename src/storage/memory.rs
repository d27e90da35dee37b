use super::{StorageError, StorageErrorKind, StorageResult, UserStore};
use crate::extract::CanonicalRecord;
use crate::nested::{Nested, NestedMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// A row as [`MemoryStore`] holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub address: Option<Nested>,
    pub additional_info: Option<NestedMap>,
}

#[derive(Default)]
struct Table {
    created: bool,
    next_id: i64,
    rows: Vec<StoredUser>,
    batch_sizes: Vec<usize>,
}

/// In-memory `users` table.
///
/// Clones share the same table. Inserting before [`UserStore::ensure_schema`]
/// fails the way a missing relation would.
#[derive(Clone, Default)]
pub struct MemoryStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Table>> {
        self.table
            .lock()
            .map_err(|_| StorageError::new(StorageErrorKind::Internal, "users table mutex poisoned"))
    }

    /// Snapshot of every stored row, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn rows(&self) -> StorageResult<Vec<StoredUser>> {
        Ok(self.lock()?.rows.clone())
    }

    /// Size of every batch received, in call order.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn batch_sizes(&self) -> StorageResult<Vec<usize>> {
        Ok(self.lock()?.batch_sizes.clone())
    }

    /// Drop every row and reset the id sequence. The table itself survives.
    ///
    /// # Errors
    /// Returns an error if the table lock is poisoned.
    pub fn truncate(&self) -> StorageResult<()> {
        let mut table = self.lock()?;
        table.rows.clear();
        table.batch_sizes.clear();
        table.next_id = 0;
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn ensure_schema(&self) -> StorageResult<()> {
        self.lock()?.created = true;
        Ok(())
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut table = self.lock()?;
        if !table.created {
            return Err(StorageError::new(
                StorageErrorKind::Insert,
                "relation \"users\" does not exist",
            ));
        }
        for rec in records {
            table.next_id += 1;
            let id = table.next_id;
            table.rows.push(StoredUser {
                id,
                name: rec.name.clone(),
                age: rec.age,
                address: rec.address.clone(),
                additional_info: rec.extra.clone(),
            });
        }
        table.batch_sizes.push(records.len());
        Ok(records.len() as u64)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        Ok(self.lock()?.rows.iter().map(|row| row.age).collect())
    }
}

/// Store used when the run is a dry run: batches are logged, never persisted.
#[derive(Debug, Default)]
pub struct DryRunStore {
    discarded: AtomicU64,
}

impl DryRunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that would have been written so far.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl UserStore for DryRunStore {
    fn ensure_schema(&self) -> StorageResult<()> {
        info!("dry run: skipping schema setup");
        Ok(())
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        let n = records.len() as u64;
        self.discarded.fetch_add(n, Ordering::Relaxed);
        info!(records = n, "dry run: batch not persisted");
        Ok(n)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        Ok(Vec::new())
    }
}
