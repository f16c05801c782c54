//! Thread-safe classification of files by hash.
//!
//! The [`HashAccumulator`] keeps every recorded file in a bucket keyed by its
//! value for the scan's hash algorithm, together with the running
//! [`ScanStats`]. One mutex covers buckets and counters, so a counter is
//! never observed out of step with the buckets.
//!
//! Files that lack a value for the algorithm are counted but kept apart in
//! an "unhashed" list. They never form a duplicate group, not even with each
//! other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::groups::{DuplicateGroup, ScanStats};
use crate::item::File;

/// Plain-data contents of a [`HashAccumulator`], as stored in checkpoints.
///
/// Buckets use ordered maps so that serializing the same contents twice
/// yields identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorState {
    /// Running counters
    pub stats: ScanStats,
    /// Hash value to files carrying it
    pub by_hash: BTreeMap<String, Vec<File>>,
    /// Files without a value for the selected algorithm
    pub unhashed: Vec<File>,
}

impl AccumulatorState {
    fn push_file(&mut self, algorithm: &str, file: File) {
        self.stats.files_scanned += 1;
        self.stats.bytes_scanned += file.size();
        match file.hash(algorithm).map(str::to_owned) {
            Some(hash) => self.by_hash.entry(hash).or_default().push(file),
            None => self.unhashed.push(file),
        }
    }

    /// Total number of files held, hashed or not.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.by_hash.values().map(Vec::len).sum::<usize>() + self.unhashed.len()
    }
}

/// Hash-to-files map plus scan counters behind a single lock.
#[derive(Debug)]
pub struct HashAccumulator {
    algorithm: String,
    state: Mutex<AccumulatorState>,
}

impl HashAccumulator {
    /// Create an empty accumulator grouping by `algorithm`.
    #[must_use]
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self::from_state(algorithm, AccumulatorState::default())
    }

    /// Rebuild an accumulator from checkpointed contents.
    #[must_use]
    pub fn from_state(algorithm: impl Into<String>, state: AccumulatorState) -> Self {
        Self {
            algorithm: algorithm.into(),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AccumulatorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The hash algorithm files are grouped by.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Count a file and put it in its bucket.
    pub fn record_file(&self, file: File) {
        self.lock().push_file(&self.algorithm, file);
    }

    /// Count one discovered folder.
    pub fn record_folder_discovered(&self) {
        self.lock().stats.folders_discovered += 1;
    }

    /// Apply one whole folder listing at once.
    pub fn record_listing(&self, folders: u64, files: Vec<File>) {
        let mut state = self.lock();
        state.stats.folders_discovered += folders;
        for file in files {
            state.push_file(&self.algorithm, file);
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.lock().stats
    }

    /// Groups of two or more files sharing a hash, in report order.
    ///
    /// May be called while recording is ongoing; each group is read at one
    /// consistent point.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = {
            let state = self.lock();
            state
                .by_hash
                .iter()
                .filter(|(_, files)| files.len() >= 2)
                .map(|(hash, files)| DuplicateGroup::new(hash.clone(), files.clone()))
                .collect()
        };
        groups.sort_by(DuplicateGroup::report_order);
        log::trace!("{} duplicate groups under {}", groups.len(), self.algorithm);
        groups
    }

    /// Copy of the contents for checkpointing.
    #[must_use]
    pub fn snapshot(&self) -> AccumulatorState {
        self.lock().clone()
    }
}
