//! Drive item model.
//!
//! Items are immutable values produced by a [`RemoteTreeAdapter`] when it
//! lists a folder. The set of kinds is closed: every listed child is either a
//! [`Folder`] or a [`File`]. Anything else is rejected by the adapter before
//! it reaches the scan engine.
//!
//! All types serialize with camelCase field names (`parentId`, `childCount`,
//! `mimeType`, ...), which is the casing used by checkpoints and JSON reports.
//!
//! [`RemoteTreeAdapter`]: crate::remote::RemoteTreeAdapter

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata shared by files and folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    /// Opaque identifier, unique within the drive
    pub id: String,
    /// Display name
    pub name: String,
    /// Size in bytes (0 for folders without a reported size)
    pub size: u64,
    /// User-facing location of the item
    pub url: String,
    /// Identifier of the containing folder
    pub parent_id: String,
    /// Human-readable path of the containing folder
    pub parent_path: String,
}

impl ItemMeta {
    /// Create item metadata.
    ///
    /// `url`, `parent_id` and `parent_path` start empty; fill them with the
    /// `with_*` methods.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
            url: String::new(),
            parent_id: String::new(),
            parent_path: String::new(),
        }
    }

    /// Set the user-facing URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the parent folder identity and path.
    #[must_use]
    pub fn with_parent(
        mut self,
        parent_id: impl Into<String>,
        parent_path: impl Into<String>,
    ) -> Self {
        self.parent_id = parent_id.into();
        self.parent_path = parent_path.into();
        self
    }
}

/// A file node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Common item metadata
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// MIME type reported by the drive, possibly empty
    #[serde(default)]
    pub mime_type: String,
    /// Hash algorithm name (e.g. `sha1Hash`) to hash value.
    ///
    /// Empty when the drive did not report any hash for this file.
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
}

impl File {
    /// Create a file without hashes.
    #[must_use]
    pub fn new(meta: ItemMeta, mime_type: impl Into<String>) -> Self {
        Self {
            meta,
            mime_type: mime_type.into(),
            hashes: BTreeMap::new(),
        }
    }

    /// Add one hash value.
    #[must_use]
    pub fn with_hash(mut self, algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        self.hashes.insert(algorithm.into(), value.into());
        self
    }

    /// Hash value for the given algorithm, if the drive reported one.
    #[must_use]
    pub fn hash(&self, algorithm: &str) -> Option<&str> {
        self.hashes.get(algorithm).map(String::as_str)
    }

    /// Whether both files carry the same value for `algorithm`.
    ///
    /// Files lacking the algorithm are never duplicates of anything.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &File, algorithm: &str) -> bool {
        match (self.hash(algorithm), other.hash(algorithm)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Shorthand for `self.meta.id`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Shorthand for `self.meta.size`.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.meta.size
    }
}

/// A folder node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Common item metadata
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Number of direct children at listing time (may be stale)
    pub child_count: u64,
}

impl Folder {
    /// Create a folder.
    #[must_use]
    pub fn new(meta: ItemMeta, child_count: u64) -> Self {
        Self { meta, child_count }
    }

    /// Shorthand for `self.meta.id`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Whether expanding this folder could yield anything.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.child_count > 0
    }
}

/// A listed child: exactly one of the two known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Item {
    /// A folder that may be expanded further
    Folder(Folder),
    /// A file that is recorded by hash
    File(File),
}

impl Item {
    /// Common metadata regardless of kind.
    #[must_use]
    pub fn meta(&self) -> &ItemMeta {
        match self {
            Item::Folder(folder) => &folder.meta,
            Item::File(file) => &file.meta,
        }
    }

    /// Item identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta().id
    }
}

impl From<Folder> for Item {
    fn from(folder: Folder) -> Self {
        Item::Folder(folder)
    }
}

impl From<File> for Item {
    fn from(file: File) -> Self {
        Item::File(file)
    }
}
