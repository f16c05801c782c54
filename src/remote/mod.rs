//! Remote tree adapter contract.
//!
//! The scan engine never talks to a drive directly. It is handed a
//! [`RemoteTreeAdapter`] that knows how to list one folder (or one page of a
//! folder) and how to turn a folder id into a [`FolderHandle`] for a later
//! listing. Adapters usually close over live credentials, so they are never
//! part of a checkpoint; a fresh adapter is supplied when a scan is resumed.
//!
//! # Architecture
//!
//! * [`RemoteTreeAdapter`]: the trait implemented by drive backends.
//! * [`PageSink`]: collects follow-up page handles during a listing.
//! * [`RemoteError`]: failures an adapter may report.
//! * [`snapshot`]: an adapter over a drive listing exported to JSON.

pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::Item;

pub use snapshot::{DriveSnapshot, SnapshotAdapter, SnapshotEntry};

/// Opaque reference to a folder page that an adapter can list.
///
/// For an HTTP backend this is typically the full listing URL, including any
/// continuation token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderHandle(String);

impl FolderHandle {
    /// Wrap a backend-specific reference.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FolderHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Follow-up handles produced while listing one folder.
///
/// A paginating adapter pushes the handle of the next page here. The
/// coordinator enqueues the collected handles only when the whole listing
/// succeeded, so a failed page never leaves a dangling continuation behind.
#[derive(Debug, Default)]
pub struct PageSink {
    handles: Vec<FolderHandle>,
}

impl PageSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `handle` to be listed later, like any discovered folder.
    pub fn enqueue_more(&mut self, handle: FolderHandle) {
        self.handles.push(handle);
    }

    /// Number of collected handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Consume the sink, yielding the collected handles in push order.
    #[must_use]
    pub fn into_handles(self) -> Vec<FolderHandle> {
        self.handles
    }
}

/// Errors a remote adapter can report.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Credentials are missing or no longer accepted.
    #[error("Not authorized to access the drive")]
    Unauthorized,

    /// A listing response lacked a required field.
    #[error("Malformed listing response: missing field '{missing_field}'")]
    Protocol {
        /// Name of the absent field
        missing_field: String,
        /// The offending response, for diagnostics
        raw_response: String,
    },

    /// A listed child was neither a file nor a folder.
    #[error("Listed item '{id}' is neither a file nor a folder")]
    UnclassifiedItem {
        /// Identifier of the item, or empty if it had none
        id: String,
        /// The offending part of the response
        raw_response: String,
    },

    /// The request itself failed (network, throttling, server error).
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Build a [`RemoteError::Protocol`].
    #[must_use]
    pub fn missing_field(field: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self::Protocol {
            missing_field: field.into(),
            raw_response: raw_response.into(),
        }
    }

    /// Ranking used when several tasks of one scan step fail.
    ///
    /// Higher is reported first: credentials outrank malformed data, which
    /// outranks transient transport problems.
    #[must_use]
    pub fn severity(&self) -> u8 {
        match self {
            Self::Unauthorized => 3,
            Self::Protocol { .. } | Self::UnclassifiedItem { .. } => 2,
            Self::Transport(_) => 1,
        }
    }

    /// The raw response attached to the error, if any.
    #[must_use]
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Protocol { raw_response, .. } | Self::UnclassifiedItem { raw_response, .. } => {
                Some(raw_response)
            }
            Self::Unauthorized | Self::Transport(_) => None,
        }
    }
}

/// A drive backend the scan engine can crawl.
///
/// Implementations are shared by all worker threads of a scan step, so they
/// must be `Send + Sync`. They may impose their own rate limiting.
pub trait RemoteTreeAdapter: Send + Sync {
    /// List the direct children of the folder page behind `handle`.
    ///
    /// If the folder continues on another page, push that page's handle into
    /// `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Unauthorized`] when credentials are rejected,
    /// [`RemoteError::Protocol`] or [`RemoteError::UnclassifiedItem`] when the
    /// response is malformed, and [`RemoteError::Transport`] otherwise.
    fn list_children(
        &self,
        handle: &FolderHandle,
        sink: &mut PageSink,
    ) -> Result<Vec<Item>, RemoteError>;

    /// Turn a folder id into a handle for a future [`list_children`] call.
    ///
    /// [`list_children`]: RemoteTreeAdapter::list_children
    fn handle_for(&self, folder_id: &str) -> FolderHandle;
}

impl<A: RemoteTreeAdapter + ?Sized> RemoteTreeAdapter for std::sync::Arc<A> {
    fn list_children(
        &self,
        handle: &FolderHandle,
        sink: &mut PageSink,
    ) -> Result<Vec<Item>, RemoteError> {
        (**self).list_children(handle, sink)
    }

    fn handle_for(&self, folder_id: &str) -> FolderHandle {
        (**self).handle_for(folder_id)
    }
}
