//! Duplicate groups and scan statistics.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is a set of at least two files that share one value
//! for the scan's hash algorithm. [`ScanStats`] carries the running counters
//! of a scan.
//!
//! # Example
//!
//! ```
//! use drivedupe::duplicates::DuplicateGroup;
//! use drivedupe::item::{File, ItemMeta};
//!
//! let files = vec![
//!     File::new(ItemMeta::new("a", "a.jpg", 1024), "image/jpeg").with_hash("sha1Hash", "H"),
//!     File::new(ItemMeta::new("b", "b.jpg", 1024), "image/jpeg").with_hash("sha1Hash", "H"),
//! ];
//!
//! let group = DuplicateGroup::new("H", files);
//! assert_eq!(group.duplicate_count(), 1);
//! assert_eq!(group.wasted_space(), 1024);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::item::File;

/// Running counters of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    /// Folders seen as children of expanded folders (the root is not counted)
    pub folders_discovered: u64,
    /// Files recorded
    pub files_scanned: u64,
    /// Sum of recorded file sizes in bytes
    pub bytes_scanned: u64,
}

impl ScanStats {
    /// Format scanned bytes as a human-readable string.
    #[must_use]
    pub fn bytes_display(&self) -> String {
        bytesize::ByteSize::b(self.bytes_scanned).to_string()
    }
}

/// Files sharing one hash value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// The shared hash value
    pub hash: String,
    /// Member files, ordered by id
    pub files: Vec<File>,
}

impl DuplicateGroup {
    /// Create a group; files are sorted by id.
    #[must_use]
    pub fn new(hash: impl Into<String>, mut files: Vec<File>) -> Self {
        files.sort_by(|a, b| a.meta.id.cmp(&b.meta.id));
        Self {
            hash: hash.into(),
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(File::size).sum()
    }

    /// Space held by every copy except the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        match self.files.first() {
            Some(first) if self.files.len() > 1 => self.total_size().saturating_sub(first.size()),
            _ => 0,
        }
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Ids of the member files.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.files.iter().map(File::id).collect()
    }

    /// Report order: most wasted space first, ties broken by hash.
    #[must_use]
    pub fn report_order(a: &Self, b: &Self) -> Ordering {
        b.wasted_space()
            .cmp(&a.wasted_space())
            .then_with(|| a.hash.cmp(&b.hash))
    }
}
