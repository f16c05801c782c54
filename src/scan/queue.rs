//! Work queue of folder handles awaiting expansion.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::remote::FolderHandle;

/// Thread-safe queue of pending folder handles.
///
/// Any worker may enqueue subfolders while others dequeue. Handles come out
/// in FIFO order, although the scan does not depend on it. Each dequeue hands
/// a handle to exactly one caller.
#[derive(Debug, Default)]
pub struct CrawlQueue {
    pending: Mutex<VecDeque<FolderHandle>>,
}

impl CrawlQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue holding `handles`, front first.
    #[must_use]
    pub fn from_handles(handles: impl IntoIterator<Item = FolderHandle>) -> Self {
        Self {
            pending: Mutex::new(handles.into_iter().collect()),
        }
    }

    // Poisoning is ignored: every critical section leaves the deque valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<FolderHandle>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a handle.
    pub fn enqueue(&self, handle: FolderHandle) {
        self.lock().push_back(handle);
    }

    /// Append several handles under one lock acquisition.
    pub fn enqueue_all(&self, handles: impl IntoIterator<Item = FolderHandle>) {
        self.lock().extend(handles);
    }

    /// Remove and return the next handle, or `None` if the queue is empty.
    #[must_use]
    pub fn dequeue(&self) -> Option<FolderHandle> {
        self.lock().pop_front()
    }

    /// Whether no handle is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of pending handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the pending handles, front first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FolderHandle> {
        self.lock().iter().cloned().collect()
    }
}
