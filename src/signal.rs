//! Ctrl+C handling.
//!
//! A scan is only interrupted between two steps, so that the checkpoint
//! written afterwards reflects a quiescent state. The handler installed here
//! merely raises a shared flag that the scan loop polls after each
//! [`advance`](crate::scan::ScanCoordinator::advance).
//!
//! ```rust,no_run
//! use drivedupe::signal::install_handler;
//!
//! let shutdown = install_handler().unwrap();
//! while !shutdown.is_shutdown_requested() {
//!     // advance the scan, save a checkpoint
//! #   break;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C): 128 + signal number.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared flag telling the scan loop to stop after the current step.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Ask the scan loop to stop.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The underlying flag, for code that only needs an `AtomicBool`.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// Later calls return the same handler with its flag cleared, so the
/// application can be run several times in one process (as tests do).
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another Ctrl+C handler was
/// registered outside this module.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut installed = None;
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        installed = Some(ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = writeln!(
                std::io::stderr(),
                "\nInterrupted. Finishing the current step and saving progress..."
            );
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        }));
        handler
    });

    match installed {
        Some(result) => result?,
        None => handler.reset(),
    }
    Ok(handler.clone())
}
