//! Plain text rendering of scan reports.

use std::io::{self, Write};

use bytesize::ByteSize;

use super::ScanReport;

/// Human-readable listing of duplicate groups followed by the summary line.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Write the listing.
    ///
    /// Each group starts with a header line, then one indented line per
    /// file with its location on the drive.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        for (index, files) in report.duplicates.iter().enumerate() {
            let size = files.first().map_or(0, |f| f.size());
            writeln!(
                writer,
                "Group {} ({} files, {} each):",
                index + 1,
                files.len(),
                ByteSize::b(size)
            )?;
            for file in files {
                let location = if file.meta.parent_path.is_empty() {
                    file.meta.name.clone()
                } else {
                    format!("{}/{}", file.meta.parent_path, file.meta.name)
                };
                if file.meta.url.is_empty() {
                    writeln!(writer, "  {location}")?;
                } else {
                    writeln!(writer, "  {location}  <{}>", file.meta.url)?;
                }
            }
            writeln!(writer)?;
        }

        if report.has_duplicates() {
            writeln!(
                writer,
                "{} duplicate groups, {} redundant files, {} reclaimable",
                report.duplicates.len(),
                report.duplicate_files(),
                ByteSize::b(report.wasted_space())
            )?;
        } else if report.complete {
            writeln!(writer, "No duplicates found.")?;
        }
        writeln!(writer, "{report}")
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
