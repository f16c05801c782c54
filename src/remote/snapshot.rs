//! Adapter over a drive listing exported to JSON.
//!
//! A snapshot is a flat list of drive items, each pointing at its parent, in
//! the shape drive APIs return them: folders carry a `folder` facet with a
//! child count, files carry a `file` facet with a MIME type and hashes.
//!
//! ```json
//! {
//!   "rootId": "root",
//!   "items": [
//!     { "id": "A", "name": "Docs", "parentId": "root", "folder": { "childCount": 1 } },
//!     { "id": "B", "name": "a.txt", "size": 12, "parentId": "A",
//!       "file": { "mimeType": "text/plain", "hashes": { "sha1Hash": "AB12" } } }
//!   ]
//! }
//! ```
//!
//! [`SnapshotAdapter`] serves listings out of such a snapshot, optionally
//! split into pages of a fixed size so that continuation handles flow through
//! the [`PageSink`] exactly like they do for a paginating HTTP backend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::item::{File, Folder, Item, ItemMeta};
use crate::remote::{FolderHandle, PageSink, RemoteError, RemoteTreeAdapter};

/// Separator between a folder id and its page number inside a handle.
const PAGE_SEPARATOR: &str = "#page=";

/// Folder facet of a snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    /// Reported number of direct children
    pub child_count: Option<u64>,
}

/// File facet of a snapshot entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    /// MIME type, if reported
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Hash algorithm name to value
    #[serde(default)]
    pub hashes: Option<BTreeMap<String, String>>,
}

/// One item of a drive snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Item identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// User-facing URL
    #[serde(default)]
    pub web_url: Option<String>,
    /// Identifier of the containing folder
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Present on folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderFacet>,
    /// Present on files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileFacet>,
}

impl SnapshotEntry {
    /// A folder entry whose child count is filled in by [`DriveSnapshot::new`].
    #[must_use]
    pub fn folder(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: None,
            web_url: None,
            parent_id: Some(parent_id.into()),
            folder: Some(FolderFacet { child_count: None }),
            file: None,
        }
    }

    /// A file entry with no hashes.
    #[must_use]
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: Some(size),
            web_url: None,
            parent_id: Some(parent_id.into()),
            folder: None,
            file: Some(FileFacet::default()),
        }
    }

    /// Attach a hash value to a file entry. No-op on folders.
    #[must_use]
    pub fn with_hash(mut self, algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(facet) = self.file.as_mut() {
            facet
                .hashes
                .get_or_insert_with(BTreeMap::new)
                .insert(algorithm.into(), value.into());
        }
        self
    }

    fn raw(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Classify the entry into an [`Item`], listed under `parent_path`.
    fn to_item(&self, parent_id: &str, parent_path: &str) -> Result<Item, RemoteError> {
        let meta = ItemMeta::new(&self.id, &self.name, self.size.unwrap_or(0))
            .with_url(self.web_url.clone().unwrap_or_default())
            .with_parent(parent_id, parent_path);

        if let Some(folder) = &self.folder {
            let child_count = folder
                .child_count
                .ok_or_else(|| RemoteError::missing_field("childCount", self.raw()))?;
            return Ok(Item::Folder(Folder::new(meta, child_count)));
        }

        if let Some(file) = &self.file {
            let mut item = File::new(meta, file.mime_type.clone().unwrap_or_default());
            if let Some(hashes) = &file.hashes {
                item.hashes = hashes.clone();
            }
            return Ok(Item::File(item));
        }

        Err(RemoteError::UnclassifiedItem {
            id: self.id.clone(),
            raw_response: self.raw(),
        })
    }
}

/// A whole drive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSnapshot {
    /// Identifier of the root folder (not itself listed in `items`)
    pub root_id: String,
    /// Every item below the root
    pub items: Vec<SnapshotEntry>,
}

impl DriveSnapshot {
    /// Build a snapshot, filling in missing folder child counts.
    #[must_use]
    pub fn new(root_id: impl Into<String>, mut items: Vec<SnapshotEntry>) -> Self {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in &items {
            if let Some(parent) = &entry.parent_id {
                *counts.entry(parent.clone()).or_default() += 1;
            }
        }
        for entry in &mut items {
            if let Some(folder) = entry.folder.as_mut() {
                if folder.child_count.is_none() {
                    folder.child_count = Some(counts.get(&entry.id).copied().unwrap_or(0));
                }
            }
        }
        Self {
            root_id: root_id.into(),
            items,
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read drive snapshot: {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse drive snapshot: {}", path.display()))?;
        log::debug!(
            "Loaded drive snapshot {} with {} items",
            path.display(),
            snapshot.items.len()
        );
        Ok(snapshot)
    }

    /// Save the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize drive snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write drive snapshot: {}", path.display()))?;
        Ok(())
    }
}

/// [`RemoteTreeAdapter`] serving listings out of a [`DriveSnapshot`].
#[derive(Debug)]
pub struct SnapshotAdapter {
    snapshot: DriveSnapshot,
    children: HashMap<String, Vec<usize>>,
    paths: HashMap<String, String>,
    page_size: Option<usize>,
    authorized: AtomicBool,
}

impl SnapshotAdapter {
    /// Serve `snapshot`, one page per folder.
    #[must_use]
    pub fn new(snapshot: DriveSnapshot) -> Self {
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in snapshot.items.iter().enumerate() {
            if let Some(parent) = &entry.parent_id {
                children.entry(parent.clone()).or_default().push(idx);
            }
        }

        let paths = folder_paths(&snapshot, &children);

        Self {
            snapshot,
            children,
            paths,
            page_size: None,
            authorized: AtomicBool::new(true),
        }
    }

    /// Split folder listings into pages of at most `size` children.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Handle of the drive root.
    #[must_use]
    pub fn root_handle(&self) -> FolderHandle {
        self.handle_for(&self.snapshot.root_id)
    }

    /// Reject every further listing with [`RemoteError::Unauthorized`].
    pub fn revoke(&self) {
        self.authorized.store(false, Ordering::SeqCst);
    }

    /// Accept listings again after [`revoke`](Self::revoke).
    pub fn restore(&self) {
        self.authorized.store(true, Ordering::SeqCst);
    }

    /// The snapshot being served.
    #[must_use]
    pub fn snapshot(&self) -> &DriveSnapshot {
        &self.snapshot
    }

    fn page_handle(folder_id: &str, page: usize) -> FolderHandle {
        if page == 0 {
            FolderHandle::new(folder_id)
        } else {
            FolderHandle::new(format!("{folder_id}{PAGE_SEPARATOR}{page}"))
        }
    }

    fn parse_handle(handle: &FolderHandle) -> Result<(&str, usize), RemoteError> {
        match handle.as_str().rsplit_once(PAGE_SEPARATOR) {
            Some((id, page)) => {
                let page = page
                    .parse()
                    .map_err(|_| RemoteError::missing_field("page", handle.as_str()))?;
                Ok((id, page))
            }
            None => Ok((handle.as_str(), 0)),
        }
    }
}

impl RemoteTreeAdapter for SnapshotAdapter {
    fn list_children(
        &self,
        handle: &FolderHandle,
        sink: &mut PageSink,
    ) -> Result<Vec<Item>, RemoteError> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Err(RemoteError::Unauthorized);
        }

        let (folder_id, page) = Self::parse_handle(handle)?;
        let Some(parent_path) = self.paths.get(folder_id) else {
            // The folder vanished since it was discovered
            log::debug!("Folder {} not found in snapshot, treating as empty", folder_id);
            return Ok(Vec::new());
        };

        let all = self.children.get(folder_id).map_or(&[][..], Vec::as_slice);
        let (start, end) = match self.page_size {
            Some(size) => (page * size, ((page + 1) * size).min(all.len())),
            None => (0, all.len()),
        };

        let mut items = Vec::with_capacity(end.saturating_sub(start));
        for &idx in all.get(start..end).unwrap_or_default() {
            items.push(self.snapshot.items[idx].to_item(folder_id, parent_path)?);
        }

        if end < all.len() {
            sink.enqueue_more(Self::page_handle(folder_id, page + 1));
        }

        log::trace!(
            "Listed {} children of {} (page {})",
            items.len(),
            folder_id,
            page
        );
        Ok(items)
    }

    fn handle_for(&self, folder_id: &str) -> FolderHandle {
        Self::page_handle(folder_id, 0)
    }
}

/// Path of every folder reachable from the root, e.g. `/root/Docs`.
fn folder_paths(
    snapshot: &DriveSnapshot,
    children: &HashMap<String, Vec<usize>>,
) -> HashMap<String, String> {
    let mut paths = HashMap::new();
    let root_path = format!("/{}", snapshot.root_id);
    let mut stack = vec![(snapshot.root_id.clone(), root_path)];

    while let Some((id, path)) = stack.pop() {
        if let Some(kids) = children.get(&id) {
            for &idx in kids {
                let entry = &snapshot.items[idx];
                if entry.folder.is_some() && !paths.contains_key(&entry.id) {
                    stack.push((entry.id.clone(), format!("{}/{}", path, entry.name)));
                }
            }
        }
        paths.insert(id, path);
    }

    paths
}
