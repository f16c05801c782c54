//! Command-line interface definitions for drivedupe.
//!
//! # Example
//!
//! ```bash
//! # Start or resume a scan, stopping after ten minutes
//! drivedupe scan --token "$TOKEN" --snapshot drive.json --budget-secs 600
//!
//! # JSON report for scripting
//! drivedupe scan --token "$TOKEN" --snapshot drive.json --output json
//!
//! # Inspect the saved progress without scanning
//! drivedupe status --token "$TOKEN"
//!
//! # Forget the saved progress
//! drivedupe discard --token "$TOKEN"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// Resumable duplicate file finder for remote drives.
///
/// Crawls the folder tree of a drive, groups files by the content hash the
/// drive reports, and saves its progress after every step so an interrupted
/// scan continues where it stopped.
#[derive(Debug, Parser)]
#[command(name = "drivedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the default one
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding saved scans (default: system temp directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start or resume a scan
    Scan(ScanArgs),
    /// Show the saved progress of a scan
    Status(StatusArgs),
    /// Delete the saved progress of a scan
    Discard(TokenArgs),
}

/// Identity a scan is saved under.
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Access token of the drive; also keys the saved scan
    #[arg(long, env = "DRIVEDUPE_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub token: TokenArgs,

    /// Drive listing exported as JSON
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Children returned per listing page
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Hash field files are compared by (e.g. sha1Hash, quickXorHash)
    #[arg(long, value_name = "NAME")]
    pub hash_algorithm: Option<String>,

    /// Folder listings started per scan step
    #[arg(long, value_name = "N")]
    pub tasks: Option<usize>,

    /// Worker threads per scan step
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Stop after this many seconds; progress is saved
    #[arg(long, value_name = "SECS")]
    pub budget_secs: Option<u64>,

    /// Drop folders whose listing failed instead of retrying them
    #[arg(long)]
    pub no_requeue: bool,

    /// Ignore any saved progress and start over
    #[arg(long)]
    pub fresh: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl ScanArgs {
    /// Override configuration values given on the command line.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(alg) = &self.hash_algorithm {
            config.hash_algorithm.clone_from(alg);
        }
        if let Some(tasks) = self.tasks {
            config.tasks_per_advance = tasks;
        }
        if let Some(threads) = self.threads {
            config.worker_threads = threads;
        }
        if let Some(secs) = self.budget_secs {
            config.budget_secs = Some(secs);
        }
        if self.no_requeue {
            config.requeue_failed = false;
        }
    }
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub token: TokenArgs,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}
