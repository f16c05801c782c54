//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "hashAlgorithm": "sha1Hash",
//!   "complete": true,
//!   "foldersDiscovered": 12,
//!   "filesScanned": 340,
//!   "bytesScanned": 1048576,
//!   "duplicates": [
//!     [ { "id": "A1", "name": "a.jpg", "size": 1024, ... }, { "id": "B7", ... } ]
//!   ],
//!   "summary": {
//!     "duplicateGroups": 1,
//!     "duplicateFiles": 1,
//!     "wastedSpace": 1024,
//!     "exitCode": 0,
//!     "exitCodeName": "DD000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::ScanReport;
use crate::error::ExitCode;

/// Totals derived from a report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (excluding one file per group)
    pub duplicate_files: usize,
    /// Bytes held by redundant copies
    pub wasted_space: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DD000")
    pub exit_code_name: String,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a ScanReport,
    summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Wrap `report` with its totals and the process exit code.
    #[must_use]
    pub fn new(report: &'a ScanReport, exit_code: ExitCode) -> Self {
        Self {
            report,
            summary: JsonSummary {
                duplicate_groups: report.duplicates.len(),
                duplicate_files: report.duplicate_files(),
                wasted_space: report.wasted_space(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// The derived totals.
    #[must_use]
    pub fn summary(&self) -> &JsonSummary {
        &self.summary
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{DuplicateGroup, ScanStats};
    use crate::item::{File, ItemMeta};

    fn report() -> ScanReport {
        let files = vec![
            File::new(
                ItemMeta::new("A1", "a.jpg", 1024).with_parent("P", "/root/Pics"),
                "image/jpeg",
            )
            .with_hash("sha1Hash", "H"),
            File::new(ItemMeta::new("B7", "b.jpg", 1024), "image/jpeg")
                .with_hash("sha1Hash", "H"),
        ];
        ScanReport::new(
            "sha1Hash",
            true,
            ScanStats {
                folders_discovered: 2,
                files_scanned: 5,
                bytes_scanned: 4096,
            },
            vec![DuplicateGroup::new("H", files)],
        )
    }

    #[test]
    fn test_json_output_empty() {
        let empty = ScanReport::new("sha1Hash", true, ScanStats::default(), Vec::new());
        let output = JsonOutput::new(&empty, ExitCode::NoDuplicates);
        assert_eq!(output.summary().duplicate_groups, 0);
        assert_eq!(output.summary().exit_code, 2);
    }

    #[test]
    fn test_to_json_compact() {
        let report = report();
        let json = JsonOutput::new(&report, ExitCode::Success)
            .to_json()
            .unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_json_is_valid_and_flattened() {
        let report = report();
        let json = JsonOutput::new(&report, ExitCode::Success)
            .to_json_pretty()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["hashAlgorithm"], "sha1Hash");
        assert_eq!(parsed["filesScanned"], 5);
        assert_eq!(parsed["duplicates"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["duplicates"][0][0]["id"], "A1");
        assert_eq!(parsed["duplicates"][0][0]["parentPath"], "/root/Pics");
        assert_eq!(parsed["summary"]["wastedSpace"], 1024);
        assert_eq!(parsed["summary"]["exitCodeName"], "DD000");
    }

    #[test]
    fn test_write_to() {
        let report = report();
        let mut buffer = Vec::new();
        JsonOutput::new(&report, ExitCode::Success)
            .write_to(&mut buffer, false)
            .unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert!(written.starts_with('{'));
        assert!(written.ends_with("}\n"));
    }
}
