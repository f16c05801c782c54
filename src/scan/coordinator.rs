//! The scan coordinator.
//!
//! A [`ScanCoordinator`] owns the [`CrawlQueue`] and the [`HashAccumulator`]
//! of one scan and borrows them to the worker tasks of each
//! [`advance`](ScanCoordinator::advance) call. The worker pool lives only
//! for the duration of that call.

use std::sync::Mutex;

use super::queue::CrawlQueue;
use super::{AdvanceOutcome, ScanError, ScanOptions};
use crate::checkpoint::ScanState;
use crate::duplicates::{DuplicateGroup, HashAccumulator, ScanStats};
use crate::item::{File, Item};
use crate::output::ScanReport;
use crate::remote::{FolderHandle, PageSink, RemoteError, RemoteTreeAdapter};

/// Result of expanding one queued handle.
enum Expansion {
    Idle,
    Expanded {
        folders: u64,
        enqueued: usize,
        files: usize,
    },
    Failed(FolderHandle, RemoteError),
}

/// Drives a crawl of a remote drive one bounded step at a time.
pub struct ScanCoordinator<A: RemoteTreeAdapter> {
    queue: CrawlQueue,
    accumulator: HashAccumulator,
    adapter: A,
    options: ScanOptions,
}

impl<A: RemoteTreeAdapter> ScanCoordinator<A> {
    /// Create an empty scan grouping files by `hash_algorithm`.
    #[must_use]
    pub fn new(hash_algorithm: impl Into<String>, adapter: A) -> Self {
        Self::with_options(hash_algorithm, adapter, ScanOptions::default())
    }

    /// Create an empty scan with explicit tuning.
    #[must_use]
    pub fn with_options(
        hash_algorithm: impl Into<String>,
        adapter: A,
        options: ScanOptions,
    ) -> Self {
        Self {
            queue: CrawlQueue::new(),
            accumulator: HashAccumulator::new(hash_algorithm),
            adapter,
            options,
        }
    }

    /// Bind a restored state to a freshly supplied adapter.
    #[must_use]
    pub fn from_state(state: ScanState, adapter: A, options: ScanOptions) -> Self {
        Self {
            queue: CrawlQueue::from_handles(state.pending),
            accumulator: HashAccumulator::from_state(state.hash_algorithm, state.accumulator),
            adapter,
            options,
        }
    }

    /// Enqueue the root folder of the crawl.
    ///
    /// The root itself is not counted as a discovered folder.
    pub fn seed(&self, root: FolderHandle) {
        log::debug!("Seeding scan with {root}");
        self.queue.enqueue(root);
    }

    /// Expand up to `tasks_per_advance` queued folders concurrently.
    ///
    /// Returns once every dispatched task has finished. A call on a complete
    /// scan does nothing.
    ///
    /// # Errors
    ///
    /// [`ScanError::Remote`] when any listing failed. Successful listings of
    /// the same step are kept. When several listings fail, the most severe
    /// error is returned and the others are logged.
    pub fn advance(&self) -> Result<AdvanceOutcome, ScanError> {
        if self.queue.is_empty() {
            log::trace!("advance() on a complete scan");
            return Ok(AdvanceOutcome::default());
        }

        let tasks = self.options.tasks_per_advance.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.worker_threads.max(1))
            .thread_name(|i| format!("drivedupe-scan-{i}"))
            .build()?;

        let outcome = Mutex::new(AdvanceOutcome::default());
        let failures = Mutex::new(Vec::new());

        pool.scope(|s| {
            for _ in 0..tasks {
                s.spawn(|_| {
                    let expansion = self.expand_next();
                    let mut outcome = outcome.lock().unwrap_or_else(|p| p.into_inner());
                    match expansion {
                        Expansion::Idle => outcome.idle += 1,
                        Expansion::Expanded {
                            folders,
                            enqueued,
                            files,
                        } => {
                            outcome.expanded += 1;
                            outcome.folders_discovered += folders;
                            outcome.handles_enqueued += enqueued;
                            outcome.files_recorded += files;
                        }
                        Expansion::Failed(handle, error) => {
                            outcome.failed += 1;
                            failures
                                .lock()
                                .unwrap_or_else(|p| p.into_inner())
                                .push((handle, error));
                        }
                    }
                });
            }
        });
        drop(pool);

        let outcome = outcome.into_inner().unwrap_or_else(|p| p.into_inner());
        let mut failures = failures.into_inner().unwrap_or_else(|p| p.into_inner());

        // Failed handles are retried on a later step, never within this one.
        if self.options.requeue_failed {
            self.queue
                .enqueue_all(failures.iter().map(|(handle, _)| handle.clone()));
        }

        log::info!(
            "Scan step: {} expanded, {} failed, {} idle; {} folders, {} files added; {} pending",
            outcome.expanded,
            outcome.failed,
            outcome.idle,
            outcome.folders_discovered,
            outcome.files_recorded,
            self.queue.len()
        );

        if failures.is_empty() {
            return Ok(outcome);
        }

        failures.sort_by_key(|(_, error)| std::cmp::Reverse(error.severity()));
        let mut failures = failures.into_iter();
        let (handle, source) = match failures.next() {
            Some(first) => first,
            None => return Ok(outcome),
        };
        let mut other_failures = 0;
        for (other, error) in failures {
            log::warn!("Listing {other} also failed: {error}");
            other_failures += 1;
        }

        Err(ScanError::Remote {
            handle,
            source,
            other_failures,
        })
    }

    /// Dequeue one handle and list it, committing the result only if the
    /// whole listing succeeded.
    fn expand_next(&self) -> Expansion {
        let Some(handle) = self.queue.dequeue() else {
            return Expansion::Idle;
        };

        let mut sink = PageSink::new();
        let children = match self.adapter.list_children(&handle, &mut sink) {
            Ok(children) => children,
            Err(error) => {
                log::debug!("Listing {handle} failed: {error}");
                return Expansion::Failed(handle, error);
            }
        };

        let mut next = sink.into_handles();
        let mut folders = 0u64;
        let mut files: Vec<File> = Vec::new();
        for child in children {
            match child {
                Item::Folder(folder) => {
                    log::trace!("Folder {} ({} children)", folder.id(), folder.child_count);
                    folders += 1;
                    if folder.has_children() {
                        next.push(self.adapter.handle_for(folder.id()));
                    }
                }
                Item::File(file) => {
                    log::trace!("File {} ({} bytes)", file.id(), file.size());
                    files.push(file);
                }
            }
        }

        let enqueued = next.len();
        let file_count = files.len();
        self.accumulator.record_listing(folders, files);
        self.queue.enqueue_all(next);

        log::debug!(
            "Listed {handle}: {folders} folders, {file_count} files, {enqueued} handles queued"
        );
        Expansion::Expanded {
            folders,
            enqueued,
            files: file_count,
        }
    }

    /// Whether no folder is left to list.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of handles waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Groups of files sharing a hash, in report order.
    #[must_use]
    pub fn duplicates(&self) -> Vec<DuplicateGroup> {
        self.accumulator.duplicate_groups()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.accumulator.stats()
    }

    /// The hash algorithm files are grouped by.
    #[must_use]
    pub fn hash_algorithm(&self) -> &str {
        self.accumulator.algorithm()
    }

    /// Tuning in effect.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// The adapter this scan lists folders with.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Plain-data copy of the scan for checkpointing.
    ///
    /// Only meaningful between [`advance`](Self::advance) calls.
    #[must_use]
    pub fn snapshot(&self) -> ScanState {
        ScanState::new(
            self.hash_algorithm(),
            self.queue.snapshot(),
            self.accumulator.snapshot(),
        )
    }

    /// Current duplicates, counters and completion flag.
    #[must_use]
    pub fn report(&self) -> ScanReport {
        ScanReport::new(
            self.hash_algorithm(),
            self.is_complete(),
            self.stats(),
            self.duplicates(),
        )
    }
}

impl<A: RemoteTreeAdapter> std::fmt::Debug for ScanCoordinator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("hash_algorithm", &self.hash_algorithm())
            .field("pending", &self.pending())
            .field("stats", &self.stats())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
