//! Plain-data scan state stored in checkpoints.

use serde::{Deserialize, Serialize};

use crate::duplicates::{AccumulatorState, ScanStats};
use crate::remote::FolderHandle;

/// Current version of the checkpoint format.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Everything needed to resume a scan, minus the adapter.
///
/// Carries no locks and no behavior; a live
/// [`ScanCoordinator`](crate::scan::ScanCoordinator) is rebuilt from it with
/// [`ScanCoordinator::from_state`](crate::scan::ScanCoordinator::from_state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    /// Format version.
    pub version: u32,
    /// Hash algorithm files are grouped by.
    pub hash_algorithm: String,
    /// Folder handles still waiting to be listed, front first.
    pub pending: Vec<FolderHandle>,
    /// Recorded files and counters.
    pub accumulator: AccumulatorState,
}

impl ScanState {
    /// Create a state with the current format version.
    #[must_use]
    pub fn new(
        hash_algorithm: impl Into<String>,
        pending: Vec<FolderHandle>,
        accumulator: AccumulatorState,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            hash_algorithm: hash_algorithm.into(),
            pending,
            accumulator,
        }
    }

    /// Whether the crawl had finished when this state was taken.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Counters at the time this state was taken.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.accumulator.stats
    }
}
