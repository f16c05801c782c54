//! Structured error handling and exit codes.

use serde::Serialize;

use crate::checkpoint::CheckpointError;
use crate::remote::RemoteError;
use crate::scan::ScanError;

/// Exit codes for the drivedupe binary.
///
/// - 0: Scan complete, duplicates found
/// - 1: General error
/// - 2: Scan complete, no duplicates
/// - 3: Scan incomplete (time budget spent, progress checkpointed)
/// - 4: The drive rejected the credentials
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Scan stopped before completion; resume it later.
    Incomplete = 3,
    /// Credentials missing or rejected; re-authenticate before resuming.
    Unauthorized = 4,
    /// Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::NoDuplicates => "DD002",
            Self::Incomplete => "DD003",
            Self::Unauthorized => "DD004",
            Self::Interrupted => "DD130",
        }
    }

    /// Exit code for a finished or stopped scan.
    #[must_use]
    pub fn for_scan(complete: bool, has_duplicates: bool) -> Self {
        match (complete, has_duplicates) {
            (false, _) => Self::Incomplete,
            (true, true) => Self::Success,
            (true, false) => Self::NoDuplicates,
        }
    }

    /// Exit code for an error returned by the application.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let unauthorized = err.chain().any(|cause| {
            cause
                .downcast_ref::<ScanError>()
                .is_some_and(ScanError::is_unauthorized)
                || cause
                    .downcast_ref::<RemoteError>()
                    .is_some_and(|e| matches!(e, RemoteError::Unauthorized))
        });
        if unauthorized {
            Self::Unauthorized
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
    /// Field missing from a malformed drive response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_field: Option<String>,
    /// The malformed drive response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Whether the failure was a missing checkpoint
    pub no_checkpoint: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let remote = err.chain().find_map(|cause| {
            cause
                .downcast_ref::<ScanError>()
                .and_then(ScanError::remote_error)
                .or_else(|| cause.downcast_ref::<RemoteError>())
        });
        let missing_field = match remote {
            Some(RemoteError::Protocol { missing_field, .. }) => Some(missing_field.clone()),
            _ => None,
        };
        let no_checkpoint = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<CheckpointError>(),
                Some(CheckpointError::NoSuchCheckpoint)
            )
        });

        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
            missing_field,
            raw_response: remote
                .and_then(RemoteError::raw_response)
                .map(str::to_owned),
            no_checkpoint,
        }
    }
}
