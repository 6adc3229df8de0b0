//! The "current upload" slot behind the upload window.
//!
//! Every upload takes a ticket when it starts. Only the holder of the newest
//! ticket may publish into the slot, so an older upload that finishes late
//! can't replace the one the window is showing.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Identifies one started upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct LatestUpload<T> {
    newest: AtomicU64,
    slot: Mutex<Option<T>>,
}

impl<T> Default for LatestUpload<T> {
    fn default() -> Self {
        Self {
            newest: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }
}

impl<T> LatestUpload<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new upload: older tickets go stale and the slot is cleared.
    pub async fn begin(&self) -> Ticket {
        let ticket = Ticket(self.newest.fetch_add(1, Ordering::SeqCst) + 1);
        self.slot.lock().await.take();
        ticket
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.newest.load(Ordering::SeqCst) == ticket.0
    }

    /// Publishes a finished upload. Returns `false` and drops `value` when a
    /// newer upload has started in the meantime.
    pub async fn finish(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.lock().await;
        if !self.is_current(ticket) {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub async fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().await
    }

    /// Blocking variant of [`LatestUpload::lock`] for use off the runtime.
    pub fn blocking_lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.blocking_lock()
    }

    /// Empties the slot and makes every running upload stale.
    pub async fn reset(&self) {
        self.newest.fetch_add(1, Ordering::SeqCst);
        self.slot.lock().await.take();
    }
}
