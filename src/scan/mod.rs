//! Resumable concurrent crawl of a remote drive.
//!
//! This module provides functionality for:
//! - Queueing folder handles awaiting expansion
//! - Expanding many folders per step over a bounded thread pool
//! - Surfacing adapter failures without losing queued work
//!
//! # Architecture
//!
//! - [`queue`]: the thread-safe [`CrawlQueue`]
//! - [`coordinator`]: the [`ScanCoordinator`] driving one step at a time
//!
//! # Example
//!
//! ```no_run
//! use drivedupe::remote::{DriveSnapshot, SnapshotAdapter};
//! use drivedupe::scan::ScanCoordinator;
//! use std::path::Path;
//!
//! let snapshot = DriveSnapshot::load(Path::new("drive.json")).unwrap();
//! let adapter = SnapshotAdapter::new(snapshot);
//! let root = adapter.root_handle();
//!
//! let scan = ScanCoordinator::new("sha1Hash", adapter);
//! scan.seed(root);
//! while !scan.is_complete() {
//!     scan.advance().unwrap();
//! }
//! for group in scan.duplicates() {
//!     println!("{}: {} copies", group.hash, group.len());
//! }
//! ```

pub mod coordinator;
pub mod queue;

pub use coordinator::ScanCoordinator;
pub use queue::CrawlQueue;

use crate::remote::{FolderHandle, RemoteError};

/// Default number of folder expansions dispatched per step.
pub const DEFAULT_TASKS_PER_ADVANCE: usize = 32;

/// Default size of the per-step worker pool.
pub const DEFAULT_WORKER_THREADS: usize = 16;

/// Tuning knobs of a scan. Never persisted with a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Folder expansions dispatched per [`ScanCoordinator::advance`] call; at
    /// least one is always dispatched.
    pub tasks_per_advance: usize,
    /// Threads in the pool built for each step.
    pub worker_threads: usize,
    /// Push a folder back onto the queue when its listing fails. It is
    /// retried on the next step, never within the same one.
    pub requeue_failed: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tasks_per_advance: DEFAULT_TASKS_PER_ADVANCE,
            worker_threads: DEFAULT_WORKER_THREADS,
            requeue_failed: true,
        }
    }
}

impl ScanOptions {
    /// Set the number of expansions per step.
    #[must_use]
    pub fn with_tasks_per_advance(mut self, tasks: usize) -> Self {
        self.tasks_per_advance = tasks.max(1);
        self
    }

    /// Set the worker pool size.
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Choose whether failed listings are retried on a later step.
    #[must_use]
    pub fn with_requeue_failed(mut self, requeue: bool) -> Self {
        self.requeue_failed = requeue;
        self
    }
}

/// What one [`ScanCoordinator::advance`] call accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Tasks that listed a folder successfully
    pub expanded: usize,
    /// Tasks that found the queue empty
    pub idle: usize,
    /// Tasks whose listing failed
    pub failed: usize,
    /// Child folders seen
    pub folders_discovered: u64,
    /// Handles added to the queue (subfolders and follow-up pages)
    pub handles_enqueued: usize,
    /// Files recorded
    pub files_recorded: usize,
}

impl AdvanceOutcome {
    /// Whether any folder was listed.
    #[must_use]
    pub fn did_work(&self) -> bool {
        self.expanded > 0
    }
}

/// Errors that can end a scan step.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A folder listing failed. Other failures of the same step are logged.
    #[error("Listing {handle} failed: {source}")]
    Remote {
        /// Handle whose listing failed
        handle: FolderHandle,
        /// The adapter's error
        #[source]
        source: RemoteError,
        /// How many more listings failed in the same step
        other_failures: usize,
    },

    /// The worker pool could not be created.
    #[error("Failed to build scan worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ScanError {
    /// The adapter error behind this failure, if any.
    #[must_use]
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote { source, .. } => Some(source),
            Self::ThreadPool(_) => None,
        }
    }

    /// Whether the drive rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.remote_error(), Some(RemoteError::Unauthorized))
    }
}
