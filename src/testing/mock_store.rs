//! Storage doubles.

use crate::extract::CanonicalRecord;
use crate::storage::{MemoryStore, StorageError, StorageErrorKind, StorageResult, UserStore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`MemoryStore`] that fails the `fail_on`-th insert call (1-based).
///
/// Calls before it succeed and land in the inner store; the failing call
/// stores nothing.
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    #[must_use]
    pub fn new(fail_on: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    /// The store holding whatever was written before the failure.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Insert calls received, including the failing one.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UserStore for FailingStore {
    fn ensure_schema(&self) -> StorageResult<()> {
        self.inner.ensure_schema()
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StorageError::new(
                StorageErrorKind::Insert,
                format!("injected failure on batch {call}"),
            ));
        }
        self.inner.insert_batch(records)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        self.inner.read_all_ages()
    }
}
