//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `drivedupe.toml` in the platform config directory, or an explicit file
//! 3. `DRIVEDUPE_*` environment variables (`DRIVEDUPE_WORKER_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example
//!
//! ```toml
//! hash_algorithm = "quickXorHash"
//! tasks_per_advance = 64
//! worker_threads = 16
//! requeue_failed = true
//! checkpoint_dir = "/var/cache/drivedupe"
//! budget_secs = 600
//! ```

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checkpoint::CheckpointStore;
use crate::scan::{ScanOptions, DEFAULT_TASKS_PER_ADVANCE, DEFAULT_WORKER_THREADS};

/// Hash algorithm used when none is configured.
pub const DEFAULT_HASH_ALGORITHM: &str = "sha1Hash";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DRIVEDUPE_";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "drivedupe.toml";

/// Errors raised while building the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or had values of the wrong type.
    #[error("Failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A value was out of range.
    #[error("Invalid configuration value for '{key}': {reason}")]
    Invalid {
        /// Offending setting
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration could not be encoded as TOML.
    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hash field files are compared by.
    pub hash_algorithm: String,
    /// Folder expansions per scan step.
    pub tasks_per_advance: usize,
    /// Threads in the per-step worker pool.
    pub worker_threads: usize,
    /// Retry failed folder listings on a later step.
    pub requeue_failed: bool,
    /// Where checkpoints are kept; the system temp directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,
    /// Wall-clock budget of one `scan` run, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            tasks_per_advance: DEFAULT_TASKS_PER_ADVANCE,
            worker_threads: DEFAULT_WORKER_THREADS,
            requeue_failed: true,
            checkpoint_dir: None,
            budget_secs: None,
        }
    }
}

impl Config {
    /// Load from the default file and the environment.
    ///
    /// Falls back to defaults when loading fails.
    #[must_use]
    pub fn load() -> Self {
        match Self::load_from_path(None) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load with `path` instead of the default file.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load_from_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The provider stack behind [`load_from_path`](Self::load_from_path).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(file) => {
                log::trace!("Reading configuration from {}", file.display());
                figment = figment.merge(Toml::file(file));
            }
            None => log::debug!("No configuration directory on this platform"),
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["token"]))
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "drivedupe", "drivedupe")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Write this configuration as TOML to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(write_err)?;
        Ok(())
    }

    /// Reject values the scan cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_algorithm.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "hash_algorithm",
                reason: "must not be empty".to_string(),
            });
        }
        if self.tasks_per_advance == 0 {
            return Err(ConfigError::Invalid {
                key: "tasks_per_advance",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.budget_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "budget_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Scan tuning derived from this configuration.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_tasks_per_advance(self.tasks_per_advance)
            .with_worker_threads(self.worker_threads)
            .with_requeue_failed(self.requeue_failed)
    }

    /// Checkpoint store in the configured directory.
    #[must_use]
    pub fn checkpoint_store(&self) -> CheckpointStore {
        match &self.checkpoint_dir {
            Some(dir) => CheckpointStore::new(dir),
            None => CheckpointStore::in_temp_dir(),
        }
    }

    /// Time budget of one run, if any.
    #[must_use]
    pub fn budget(&self) -> Option<Duration> {
        self.budget_secs.map(Duration::from_secs)
    }
}
