//! DriveDupe - resumable duplicate file finder for remote drives
//!
//! Crawls the folder tree of a paginated remote drive concurrently, groups
//! files by the content hash the drive reports, and checkpoints its progress
//! so that a scan can be spread over many short runs.
//!
//! The engine lives in [`scan`] and talks to drives only through the
//! [`remote::RemoteTreeAdapter`] trait. [`checkpoint`] persists scans,
//! [`output`] renders reports.

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod item;
pub mod logging;
pub mod output;
pub mod progress;
pub mod remote;
pub mod scan;
pub mod signal;

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Instant;

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs, StatusArgs, TokenArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{JsonOutput, ScanReport, TextOutput};
use crate::progress::Progress;
use crate::remote::{DriveSnapshot, SnapshotAdapter};
use crate::scan::ScanCoordinator;

/// Run the command described by `cli`.
///
/// Logging must already be initialized.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(Some(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(dir) = cli.checkpoint_dir.clone() {
        config.checkpoint_dir = Some(dir);
    }

    match &cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet),
        Commands::Status(args) => run_status(args, &config),
        Commands::Discard(args) => run_discard(args, &config, cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    args.apply_to(&mut config);
    config.validate()?;

    let token = args.token.token.as_str();
    let store = config.checkpoint_store();
    if args.fresh && store.discard(token)? {
        log::info!("Discarded saved progress");
    }

    let snapshot = DriveSnapshot::load(&args.snapshot)?;
    let mut adapter = SnapshotAdapter::new(snapshot);
    if let Some(size) = args.page_size {
        adapter = adapter.with_page_size(size);
    }
    let root = adapter.root_handle();
    let options = config.scan_options();

    let scan = match store.load(token) {
        Ok(state) => {
            if state.hash_algorithm != config.hash_algorithm {
                log::warn!(
                    "Saved scan compares files by '{}'; ignoring '{}' (use --fresh to start over)",
                    state.hash_algorithm,
                    config.hash_algorithm
                );
            }
            log::info!(
                "Resuming scan: {} folders pending, {} files scanned",
                state.pending.len(),
                state.stats().files_scanned
            );
            ScanCoordinator::from_state(state, adapter, options)
        }
        Err(CheckpointError::NoSuchCheckpoint) => {
            log::info!("Starting new scan of {}", args.snapshot.display());
            let scan =
                ScanCoordinator::with_options(config.hash_algorithm.as_str(), adapter, options);
            scan.seed(root);
            scan
        }
        Err(e) => return Err(e).context("Failed to load saved progress"),
    };

    let shutdown = signal::install_handler()?;
    let progress = Progress::new(quiet || args.output == OutputFormat::Json);
    let budget = config.budget();
    let started = Instant::now();

    while !scan.is_complete() {
        if shutdown.is_shutdown_requested() {
            break;
        }
        if budget.is_some_and(|b| started.elapsed() >= b) {
            log::info!("Time budget of {}s spent", config.budget_secs.unwrap_or_default());
            break;
        }

        if let Err(e) = scan.advance() {
            progress.clear();
            return Err(e).context("Scan step failed; last saved progress kept");
        }
        save(&store, &scan, token)?;
        progress.update(&scan.stats(), scan.pending());
    }
    progress.clear();

    let report = scan.report();
    let code = if shutdown.is_shutdown_requested() && !report.complete {
        ExitCode::Interrupted
    } else {
        ExitCode::for_scan(report.complete, report.has_duplicates())
    };
    if !report.complete {
        log::info!("Scan stopped with {} folders pending; run again to continue", scan.pending());
    }
    print_report(&report, args.output, code)?;
    Ok(code)
}

fn save<A: remote::RemoteTreeAdapter>(
    store: &CheckpointStore,
    scan: &ScanCoordinator<A>,
    token: &str,
) -> Result<()> {
    store
        .save(&scan.snapshot(), token)
        .context("Failed to save scan progress")?;
    Ok(())
}

fn run_status(args: &StatusArgs, config: &Config) -> Result<ExitCode> {
    let store = config.checkpoint_store();
    let info = store
        .load_info(&args.token.token)
        .context("Failed to read saved progress")?;

    log::info!(
        "Progress saved at {} with {} folders pending",
        info.saved_at.to_rfc3339(),
        info.state.pending.len()
    );
    let report = ScanReport::from_state(info.state);
    let code = ExitCode::for_scan(report.complete, report.has_duplicates());
    print_report(&report, args.output, code)?;
    Ok(code)
}

fn run_discard(args: &TokenArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let store = config.checkpoint_store();
    let removed = store.discard(&args.token)?;
    if !quiet {
        if removed {
            println!("Discarded saved scan.");
        } else {
            println!("No saved scan for this token.");
        }
    }
    Ok(ExitCode::Success)
}

fn print_report(report: &ScanReport, format: OutputFormat, code: ExitCode) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => TextOutput::new(report).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(report, code).write_to(&mut out, true)?,
    }
    out.flush()?;
    Ok(())
}
