//! Reporting surface of a scan.
//!
//! [`ScanReport`] gathers the duplicate groups, the counters and the
//! completion flag of a scan. It can be rendered as:
//! - JSON for automation and scripting ([`JsonOutput`])
//! - plain text for terminals ([`TextOutput`])
//!
//! # Example
//!
//! ```no_run
//! use drivedupe::output::{JsonOutput, ScanReport};
//! use drivedupe::duplicates::ScanStats;
//! use drivedupe::error::ExitCode;
//!
//! let report = ScanReport::new("sha1Hash", true, ScanStats::default(), Vec::new());
//! println!("{report}");
//!
//! let output = JsonOutput::new(&report, ExitCode::NoDuplicates);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checkpoint::ScanState;
use crate::duplicates::{DuplicateGroup, HashAccumulator, ScanStats};
use crate::item::File;

/// Duplicates found so far plus scan counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Hash algorithm files were compared by
    pub hash_algorithm: String,
    /// Whether the crawl has finished
    pub complete: bool,
    /// Folders discovered below the root
    pub folders_discovered: u64,
    /// Files recorded
    pub files_scanned: u64,
    /// Bytes recorded
    pub bytes_scanned: u64,
    /// Groups of at least two files sharing one hash, in report order
    pub duplicates: Vec<Vec<File>>,
}

impl ScanReport {
    /// Build a report from counters and groups.
    #[must_use]
    pub fn new(
        hash_algorithm: impl Into<String>,
        complete: bool,
        stats: ScanStats,
        groups: Vec<DuplicateGroup>,
    ) -> Self {
        Self {
            hash_algorithm: hash_algorithm.into(),
            complete,
            folders_discovered: stats.folders_discovered,
            files_scanned: stats.files_scanned,
            bytes_scanned: stats.bytes_scanned,
            duplicates: groups.into_iter().map(|g| g.files).collect(),
        }
    }

    /// Report of a saved scan, without resuming it.
    #[must_use]
    pub fn from_state(state: ScanState) -> Self {
        let complete = state.is_complete();
        let stats = state.stats();
        let accumulator = HashAccumulator::from_state(state.hash_algorithm, state.accumulator);
        Self::new(accumulator.algorithm(), complete, stats, accumulator.duplicate_groups())
    }

    /// Counters as [`ScanStats`].
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        ScanStats {
            folders_discovered: self.folders_discovered,
            files_scanned: self.files_scanned,
            bytes_scanned: self.bytes_scanned,
        }
    }

    /// Whether at least one duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Number of redundant copies (all files minus one per group).
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.duplicates
            .iter()
            .map(|g| g.len().saturating_sub(1))
            .sum()
    }

    /// Bytes held by redundant copies.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.duplicates
            .iter()
            .map(|g| g.iter().skip(1).map(File::size).sum::<u64>())
            .sum()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate File Scan using '{}' ({}): ",
            self.hash_algorithm,
            if self.complete { "complete" } else { "in progress" },
        )?;
        write!(
            f,
            "{} folders discovered, {} files scanned totaling {}",
            self.folders_discovered,
            self.files_scanned,
            bytesize::ByteSize::b(self.bytes_scanned)
        )
    }
}
