//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::progress::humanize_bytes;
use crate::progress::humanize_duration;
use anyhow::Result;
use console::Term;
use console::style;
use ferry_core::DownloadReport;
use ferry_core::ExtractionReport;
use ferry_core::PackReport;
use ferry_core::UploadReport;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn success_line(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }

    fn note_line(&self, note: &str) {
        if self.use_colors {
            let _ = self.term.write_line(&style(note).dim().to_string());
        } else {
            let _ = self.term.write_line(note);
        }
    }

    fn pack_details(&self, report: &PackReport) {
        let _ = self.term.write_line(&format!(
            "  Files: {}  Directories: {}  Symlinks: {}",
            report.files_added, report.directories_added, report.symlinks_added
        ));
        let _ = self.term.write_line(&format!(
            "  Size: {} → {}",
            humanize_bytes(report.bytes_read),
            humanize_bytes(report.bytes_compressed)
        ));

        if self.verbose {
            if report.special_skipped > 0 {
                let _ = self.term.write_line(&format!(
                    "  Special files skipped: {}",
                    report.special_skipped
                ));
            }
            let _ = self.term.write_line(&format!(
                "  Duration: {}",
                humanize_duration(report.duration)
            ));
        }
    }

    fn extraction_details(&self, report: &ExtractionReport) {
        let _ = self.term.write_line(&format!(
            "  Files: {}  Directories: {}  Symlinks: {}",
            report.files_extracted, report.directories_created, report.symlinks_created
        ));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            humanize_bytes(report.bytes_written)
        ));

        if self.verbose {
            if report.total_skipped() > 0 {
                let _ = self.term.write_line(&format!(
                    "  Skipped: {} metadata, {} unsupported",
                    report.noise_skipped, report.unsupported_skipped
                ));
            }
            for path in report.paths() {
                let _ = self.term.write_line(&format!("    {}", path.display()));
            }
            let _ = self.term.write_line(&format!(
                "  Duration: {}",
                humanize_duration(report.duration)
            ));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_pack_result(&self, output_path: &Path, report: &PackReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.success_line(&format!("Archive written: {}", output_path.display()));
        self.pack_details(report);
        Ok(())
    }

    fn format_unpack_result(&self, report: &ExtractionReport, note: Option<&str>) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.success_line(&format!("Unpacked into {}", report.root.display()));
        self.extraction_details(report);
        if let Some(note) = note {
            self.note_line(note);
        }
        Ok(())
    }

    fn format_upload_result(&self, report: &UploadReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.success_line(&report.summary());
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Upload id: {}", report.upload_id));
            self.pack_details(&report.pack);
        }
        Ok(())
    }

    fn format_download_result(&self, report: &DownloadReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.success_line(&format!(
            "Successfully downloaded {} from machine {} to {}",
            report.source_path,
            report.machine_id,
            report.destination.display()
        ));
        if self.verbose {
            let _ = self.term.write_line(&format!(
                "  Archive size: {}",
                humanize_bytes(report.archive_bytes)
            ));
            self.extraction_details(&report.extraction);
        }
        if let Some(note) = report.note() {
            self.note_line(&note);
        }
        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
