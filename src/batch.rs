//! Batch accumulation for storage writes.
//!
//! Accepted records are held in arrival order until the input is exhausted,
//! then written through a [`UserStore`] in contiguous chunks of at most
//! `batch_size` records. Chunks go out one at a time; the first failing chunk
//! ends the drain.

use crate::extract::CanonicalRecord;
use crate::storage::{StorageResult, UserStore};
use std::num::NonZeroUsize;
use tracing::debug;

/// Default number of records per insert.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

#[derive(Debug, Clone)]
pub struct BatchAccumulator {
    batch_size: NonZeroUsize,
    pending: Vec<CanonicalRecord>,
}

impl BatchAccumulator {
    #[must_use]
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, record: CanonicalRecord) {
        self.pending.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Number of insert calls a drain would issue.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.pending.len().div_ceil(self.batch_size.get())
    }

    /// The pending records split into insert-sized chunks, in order.
    pub fn batches(&self) -> impl Iterator<Item = &[CanonicalRecord]> {
        self.pending.chunks(self.batch_size.get())
    }

    /// Write every pending record through `store`, one batch after another.
    ///
    /// Returns the number of records written. Pending records are consumed
    /// whether or not the drain succeeds.
    ///
    /// # Errors
    /// Returns the first storage error; later batches are not attempted.
    pub fn drain_into<S: UserStore + ?Sized>(&mut self, store: &S) -> StorageResult<u64> {
        let pending = std::mem::take(&mut self.pending);
        let total_batches = pending.len().div_ceil(self.batch_size.get());
        let mut written = 0u64;
        for (i, batch) in pending.chunks(self.batch_size.get()).enumerate() {
            debug!(batch = i + 1, total_batches, records = batch.len(), "inserting batch");
            store.insert_batch(batch)?;
            written += batch.len() as u64;
        }
        Ok(written)
    }
}
