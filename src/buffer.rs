//! Pending-write accumulation and batched flush.
//!
//! Workers hand their cell writes to the buffer; the buffer is the only
//! component that mutates or clears the pending set. A flush swaps the
//! entire set out atomically, so enqueue never waits on an in-flight
//! persistence call.

use std::mem;
use std::sync::Mutex;

use crate::error::BrandpulseError;
use crate::retry::{self, RetryPolicy};
use crate::sheets::{PendingWrite, SheetStore};

#[derive(Default)]
pub struct WriteBuffer {
    pending: Mutex<Vec<PendingWrite>>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append writes to the pending set. Safe under concurrent invocation;
    /// later writes to the same address win over earlier ones.
    pub fn enqueue(&self, writes: Vec<PendingWrite>) {
        self.pending.lock().expect("buffer lock poisoned").extend(writes);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("buffer lock poisoned").len()
    }

    /// Persist the current pending set as one batched call under the given
    /// retry policy, returning the number of writes flushed.
    ///
    /// The set is taken in one swap before the call; writes enqueued while
    /// the flush is in flight land in a fresh set. If the batched call
    /// exhausts its retries the batch is put back in front of the pending
    /// set — a failed flush never silently drops writes — and the failure
    /// is surfaced as [`BrandpulseError::Persist`].
    pub async fn flush(
        &self,
        store: &impl SheetStore,
        policy: &RetryPolicy,
    ) -> Result<usize, BrandpulseError> {
        let batch = {
            let mut pending = self.pending.lock().expect("buffer lock poisoned");
            mem::take(&mut *pending)
        };
        if batch.is_empty() {
            return Ok(0);
        }

        let batch_ref = &batch;
        match retry::run(policy, move || store.batch_update(batch_ref)).await {
            Ok(()) => Ok(batch.len()),
            Err(err) => {
                let mut pending = self.pending.lock().expect("buffer lock poisoned");
                let newer = mem::take(&mut *pending);
                *pending = batch;
                pending.extend(newer);
                Err(BrandpulseError::Persist(err))
            }
        }
    }
}
