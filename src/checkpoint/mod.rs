//! Resumable scan checkpoints.
//!
//! This module provides:
//! - [`ScanState`]: the plain-data state of a scan, minus its adapter
//! - [`CheckpointStore`]: saving and restoring that state under a token
//!
//! # Example
//!
//! ```no_run
//! use drivedupe::checkpoint::{CheckpointError, CheckpointStore};
//! use drivedupe::remote::{DriveSnapshot, SnapshotAdapter};
//! use drivedupe::scan::{ScanCoordinator, ScanOptions};
//! use std::path::Path;
//!
//! let store = CheckpointStore::in_temp_dir();
//! let adapter = SnapshotAdapter::new(DriveSnapshot::load(Path::new("drive.json")).unwrap());
//! let root = adapter.root_handle();
//!
//! let scan = match store.resume("token", adapter, ScanOptions::default()) {
//!     Ok(scan) => scan,
//!     Err(CheckpointError::NoSuchCheckpoint) => {
//!         let snapshot = DriveSnapshot::load(Path::new("drive.json")).unwrap();
//!         let adapter = SnapshotAdapter::new(snapshot);
//!         let scan = ScanCoordinator::new("sha1Hash", adapter);
//!         scan.seed(root);
//!         scan
//!     }
//!     Err(e) => panic!("{e}"),
//! };
//!
//! scan.advance().unwrap();
//! store.save(&scan.snapshot(), "token").unwrap();
//! ```

pub mod data;
pub mod io;

pub use data::{ScanState, CHECKPOINT_VERSION};
pub use io::{CheckpointError, CheckpointInfo, CheckpointResult, CheckpointStore};
