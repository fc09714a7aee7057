//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use ferry_core::DownloadReport;
use ferry_core::ExtractionReport;
use ferry_core::PackReport;
use ferry_core::UploadReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct PackOutput {
    files_added: usize,
    directories_added: usize,
    symlinks_added: usize,
    special_skipped: usize,
    bytes_read: u64,
    bytes_compressed: u64,
    duration_ms: u128,
}

impl From<&PackReport> for PackOutput {
    fn from(report: &PackReport) -> Self {
        Self {
            files_added: report.files_added,
            directories_added: report.directories_added,
            symlinks_added: report.symlinks_added,
            special_skipped: report.special_skipped,
            bytes_read: report.bytes_read,
            bytes_compressed: report.bytes_compressed,
            duration_ms: report.duration.as_millis(),
        }
    }
}

#[derive(Serialize)]
struct ExtractionOutput {
    destination: String,
    reveal: String,
    files_extracted: usize,
    directories_created: usize,
    symlinks_created: usize,
    noise_skipped: usize,
    unsupported_skipped: usize,
    bytes_written: u64,
    duration_ms: u128,
    paths: Vec<String>,
}

impl From<&ExtractionReport> for ExtractionOutput {
    fn from(report: &ExtractionReport) -> Self {
        Self {
            destination: report.root.display().to_string(),
            reveal: report.reveal_candidate().display().to_string(),
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            noise_skipped: report.noise_skipped,
            unsupported_skipped: report.unsupported_skipped,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
            paths: report.paths().map(|p| p.display().to_string()).collect(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_pack_result(&self, output_path: &Path, report: &PackReport) -> Result<()> {
        #[derive(Serialize)]
        struct PackResult {
            output_path: String,
            #[serde(flatten)]
            pack: PackOutput,
        }

        let data = PackResult {
            output_path: output_path.display().to_string(),
            pack: report.into(),
        };
        Self::output(&JsonOutput::success("pack", data))
    }

    fn format_unpack_result(&self, report: &ExtractionReport, note: Option<&str>) -> Result<()> {
        #[derive(Serialize)]
        struct UnpackResult<'a> {
            #[serde(flatten)]
            extraction: ExtractionOutput,
            #[serde(skip_serializing_if = "Option::is_none")]
            note: Option<&'a str>,
        }

        let data = UnpackResult {
            extraction: report.into(),
            note,
        };
        Self::output(&JsonOutput::success("unpack", data))
    }

    fn format_upload_result(&self, report: &UploadReport) -> Result<()> {
        #[derive(Serialize)]
        struct UploadResult {
            machine_id: String,
            source: String,
            destination_parent: String,
            upload_id: String,
            duration_ms: u128,
            pack: PackOutput,
        }

        let data = UploadResult {
            machine_id: report.machine_id.clone(),
            source: report.source.display().to_string(),
            destination_parent: report.destination_parent.clone(),
            upload_id: report.upload_id.clone(),
            duration_ms: report.duration.as_millis(),
            pack: (&report.pack).into(),
        };
        Self::output(&JsonOutput::success("upload", data))
    }

    fn format_download_result(&self, report: &DownloadReport) -> Result<()> {
        #[derive(Serialize)]
        struct DownloadResult {
            machine_id: String,
            source_path: String,
            archive_bytes: u64,
            opened: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            note: Option<String>,
            duration_ms: u128,
            #[serde(flatten)]
            extraction: ExtractionOutput,
        }

        let data = DownloadResult {
            machine_id: report.machine_id.clone(),
            source_path: report.source_path.clone(),
            archive_bytes: report.archive_bytes,
            opened: report.open == ferry_core::OpenOutcome::Opened,
            note: report.note(),
            duration_ms: report.duration.as_millis(),
            extraction: (&report.extraction).into(),
        };
        Self::output(&JsonOutput::success("download", data))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::error("error", format!("{error:#}"));
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ferry_core::EntryType;
    use std::path::PathBuf;

    #[test]
    fn test_extraction_output_lists_paths_and_reveal() {
        let mut report = ExtractionReport {
            root: PathBuf::from("/dest"),
            ..ExtractionReport::default()
        };
        report.record(PathBuf::from("/dest/app"), EntryType::Directory);
        report.record(PathBuf::from("/dest/app/bin"), EntryType::File);

        let json = serde_json::to_value(ExtractionOutput::from(&report)).unwrap();
        assert_eq!(json["reveal"], "/dest/app");
        assert_eq!(json["files_extracted"], 1);
        assert_eq!(json["paths"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_error_output_shape() {
        let output = JsonOutput::error("error", "boom");
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }
}
