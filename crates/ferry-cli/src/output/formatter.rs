//! Output formatter trait for CLI results.

use anyhow::Result;
use ferry_core::DownloadReport;
use ferry_core::ExtractionReport;
use ferry_core::PackReport;
use ferry_core::UploadReport;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of packing into a local file
    fn format_pack_result(&self, output_path: &Path, report: &PackReport) -> Result<()>;

    /// Format the result of unpacking a local archive
    fn format_unpack_result(&self, report: &ExtractionReport, note: Option<&str>) -> Result<()>;

    /// Format a completed upload
    fn format_upload_result(&self, report: &UploadReport) -> Result<()>;

    /// Format a completed download
    fn format_download_result(&self, report: &DownloadReport) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
