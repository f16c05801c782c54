//! Saving, loading and verifying checkpoint files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::data::{ScanState, CHECKPOINT_VERSION};
use crate::remote::RemoteTreeAdapter;
use crate::scan::{ScanCoordinator, ScanOptions};

/// File name prefix of every checkpoint.
const FILE_PREFIX: &str = "drivedupe-";

/// Errors that can occur while persisting or restoring a scan.
#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    /// Nothing was saved under the requested token.
    #[error("No saved scan exists for this token")]
    NoSuchCheckpoint,

    /// Reading or writing the checkpoint file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint could not be encoded or decoded.
    #[error("Failed to parse checkpoint {path}: {source}")]
    Serialization {
        /// Checkpoint file
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The stored checksum does not match the stored state.
    #[error("Checkpoint integrity check failed: checksum mismatch in {0}")]
    Corrupted(PathBuf),

    /// The checkpoint was written by an incompatible version.
    #[error("Unsupported checkpoint version: {found}. Current version is {expected}.")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}

/// Result alias for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// On-disk wrapper adding an integrity checksum and a timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointEnvelope {
    /// SHA256 of the compact JSON encoding of `state`.
    checksum: String,
    /// When the checkpoint was written.
    saved_at: DateTime<Utc>,
    state: ScanState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointEnvelopeRef<'a> {
    checksum: String,
    saved_at: DateTime<Utc>,
    state: &'a ScanState,
}

/// Metadata of a stored checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    /// When it was written
    pub saved_at: DateTime<Utc>,
    /// The restored state
    pub state: ScanState,
}

/// Directory of checkpoints, one file per token.
///
/// Tokens are never written to disk: a file is named after the SHA256 digest
/// of its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store checkpoints in `dir`, created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store checkpoints in the system temporary directory.
    #[must_use]
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Directory holding the checkpoints.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable storage key for `token`: hex SHA256 digest.
    #[must_use]
    pub fn token_key(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    /// Checkpoint file used for `token`.
    #[must_use]
    pub fn path_for(&self, token: &str) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}.json", Self::token_key(token)))
    }

    /// Whether a checkpoint exists for `token`.
    #[must_use]
    pub fn exists(&self, token: &str) -> bool {
        self.path_for(token).is_file()
    }

    /// Save `state` under `token`, replacing any previous checkpoint.
    ///
    /// Must not be called while a scan step is running on the coordinator
    /// the state was taken from. The file is written next to its final
    /// location and renamed into place.
    pub fn save(&self, state: &ScanState, token: &str) -> CheckpointResult<PathBuf> {
        let path = self.path_for(token);
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = encode(state, &path)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| CheckpointError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;

        log::debug!(
            "Saved checkpoint {} ({} pending folders, {} files)",
            path.display(),
            state.pending.len(),
            state.accumulator.stats.files_scanned
        );
        Ok(path)
    }

    /// Load the state saved under `token`.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::NoSuchCheckpoint`] when nothing was saved for the
    /// token; other variants when the file is unreadable or damaged.
    pub fn load(&self, token: &str) -> CheckpointResult<ScanState> {
        self.load_info(token).map(|info| info.state)
    }

    /// Load the state saved under `token` with its timestamp.
    pub fn load_info(&self, token: &str) -> CheckpointResult<CheckpointInfo> {
        let path = self.path_for(token);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckpointError::NoSuchCheckpoint)
            }
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };
        decode(&content, &path)
    }

    /// Load the state saved under `token` and bind it to `adapter`.
    pub fn resume<A: RemoteTreeAdapter>(
        &self,
        token: &str,
        adapter: A,
        options: ScanOptions,
    ) -> CheckpointResult<ScanCoordinator<A>> {
        let state = self.load(token)?;
        log::info!(
            "Resuming scan: {} pending folders, {} files scanned",
            state.pending.len(),
            state.accumulator.stats.files_scanned
        );
        Ok(ScanCoordinator::from_state(state, adapter, options))
    }

    /// Delete the checkpoint for `token`.
    ///
    /// Returns `false` if there was none.
    pub fn discard(&self, token: &str) -> CheckpointResult<bool> {
        let path = self.path_for(token);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Discarded checkpoint {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io { path, source }),
        }
    }
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

fn checksum(state: &ScanState, path: &Path) -> CheckpointResult<String> {
    // Compact encoding; BTreeMap buckets keep it stable across round trips
    let compact = serde_json::to_string(state).map_err(|source| CheckpointError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("{:x}", Sha256::digest(compact.as_bytes())))
}

fn encode(state: &ScanState, path: &Path) -> CheckpointResult<String> {
    let envelope = CheckpointEnvelopeRef {
        checksum: checksum(state, path)?,
        saved_at: Utc::now(),
        state,
    };
    serde_json::to_string_pretty(&envelope).map_err(|source| CheckpointError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn decode(content: &str, path: &Path) -> CheckpointResult<CheckpointInfo> {
    let envelope: CheckpointEnvelope =
        serde_json::from_str(content).map_err(|source| CheckpointError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;

    if checksum(&envelope.state, path)? != envelope.checksum {
        return Err(CheckpointError::Corrupted(path.to_path_buf()));
    }

    if envelope.state.version != CHECKPOINT_VERSION {
        return Err(CheckpointError::UnsupportedVersion {
            found: envelope.state.version,
            expected: CHECKPOINT_VERSION,
        });
    }

    Ok(CheckpointInfo {
        saved_at: envelope.saved_at,
        state: envelope.state,
    })
}
