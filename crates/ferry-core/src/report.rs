//! Reports returned by pack, unpack, upload and download operations.

use crate::types::EntryType;
use crate::types::ExtractedPath;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Report of a pack operation.
///
/// # Examples
///
/// ```
/// use ferry_core::PackReport;
///
/// let mut report = PackReport::default();
/// report.bytes_read = 1024;
/// report.bytes_compressed = 256;
///
/// assert_eq!(report.compression_ratio(), 4.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackReport {
    /// Number of regular files added.
    pub files_added: usize,

    /// Number of directory entries added.
    pub directories_added: usize,

    /// Number of symlink entries added.
    pub symlinks_added: usize,

    /// Device nodes, sockets and FIFOs left out of the archive.
    pub special_skipped: usize,

    /// Uncompressed file content read from disk.
    pub bytes_read: u64,

    /// Size of the finished gzip stream.
    pub bytes_compressed: u64,

    /// Duration of the pack operation.
    pub duration: Duration,
}

impl PackReport {
    /// Total number of entries written to the archive.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.files_added + self.directories_added + self.symlinks_added
    }

    /// Uncompressed over compressed size; `0.0` for an empty stream.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_compressed == 0 {
            return 0.0;
        }
        self.bytes_read as f64 / self.bytes_compressed as f64
    }
}

/// Report of an unpack operation.
///
/// Holds the set of absolute paths written under the destination root.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Canonical destination root every extracted path lives under.
    pub root: PathBuf,

    /// Every path written, tagged with its kind.
    pub extracted: BTreeSet<ExtractedPath>,

    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directory entries materialized.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// `._*` entries dropped.
    pub noise_skipped: usize,

    /// Hard links, devices, FIFOs and other kinds left out.
    pub unsupported_skipped: usize,

    /// Total file content written to disk.
    pub bytes_written: u64,

    /// Duration of the unpack operation.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Records a written path; counters only move for paths not seen before.
    pub fn record(&mut self, path: PathBuf, entry_type: EntryType) {
        let counter = match entry_type {
            EntryType::File => &mut self.files_extracted,
            EntryType::Directory => &mut self.directories_created,
            EntryType::Symlink { .. } => &mut self.symlinks_created,
        };
        if self.extracted.insert(ExtractedPath::new(path, entry_type)) {
            *counter += 1;
        }
    }

    /// Iterates over the written paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.extracted.iter().map(ExtractedPath::as_path)
    }

    /// The single top-level item written, or the root when there are zero or
    /// several.
    #[must_use]
    pub fn reveal_candidate(&self) -> PathBuf {
        crate::resolve::resolve(self.paths(), &self.root)
    }

    /// Returns total number of entries materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created + self.symlinks_created
    }

    /// Returns total number of entries skipped.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.noise_skipped + self.unsupported_skipped
    }
}

/// Report of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Remote machine the archive went to.
    pub machine_id: String,

    /// Local path that was packed.
    pub source: PathBuf,

    /// Remote folder the archive was unpacked into.
    pub destination_parent: String,

    /// Session id assigned by the control API.
    pub upload_id: String,

    /// Packing statistics.
    pub pack: PackReport,

    /// Wall-clock time of the whole flow.
    pub duration: Duration,
}

impl UploadReport {
    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Successfully uploaded {} to {} on machine {}",
            self.source.display(),
            self.destination_parent,
            self.machine_id
        )
    }
}

/// Outcome of the optional open step after a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Opening was not requested, or nothing was extracted.
    NotRequested,

    /// The reveal candidate was handed to the system handler.
    Opened,

    /// The handler failed; the message is advisory only.
    Failed(String),
}

impl OpenOutcome {
    /// User-facing line describing the outcome; `folder` selects the wording
    /// for a revealed destination root over a single item.
    #[must_use]
    pub fn note(&self, folder: bool) -> Option<String> {
        match self {
            Self::NotRequested => None,
            Self::Opened if folder => Some("Destination folder opened automatically.".to_string()),
            Self::Opened => Some("Item opened automatically.".to_string()),
            Self::Failed(reason) if folder => Some(format!(
                "(Note: Failed to automatically open folder: {reason})"
            )),
            Self::Failed(reason) => Some(format!("(Note: Failed to automatically open: {reason})")),
        }
    }
}

/// Report of a completed download.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    /// Remote machine the archive came from.
    pub machine_id: String,

    /// Remote path that was requested.
    pub source_path: String,

    /// Local destination root.
    pub destination: PathBuf,

    /// Size of the fetched gzip stream.
    pub archive_bytes: u64,

    /// Unpacking statistics and written paths.
    pub extraction: ExtractionReport,

    /// Single top-level item, or the destination root.
    pub reveal: PathBuf,

    /// Result of the open step.
    pub open: OpenOutcome,

    /// Wall-clock time of the whole flow.
    pub duration: Duration,
}

impl DownloadReport {
    /// Returns `true` when the reveal candidate is the destination root.
    #[must_use]
    pub fn reveals_destination(&self) -> bool {
        self.reveal == self.destination
    }

    /// Advisory note about the open step, if any.
    #[must_use]
    pub fn note(&self) -> Option<String> {
        self.open.note(self.reveals_destination())
    }

    /// Human summary, with the open note on a second line when present.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Successfully downloaded {} from machine {} to {}",
            self.source_path,
            self.machine_id,
            self.destination.display()
        );
        if let Some(note) = self.note() {
            message.push('\n');
            message.push_str(&note);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_report(reveal: &str, open: OpenOutcome) -> DownloadReport {
        DownloadReport {
            machine_id: "m-1".into(),
            source_path: "/Users/vagrant/out".into(),
            destination: PathBuf::from("/d"),
            archive_bytes: 10,
            extraction: ExtractionReport::default(),
            reveal: PathBuf::from(reveal),
            open,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_pack_report_ratio() {
        let report = PackReport {
            bytes_read: 1000,
            bytes_compressed: 250,
            ..PackReport::default()
        };
        assert!((report.compression_ratio() - 4.0).abs() < f64::EPSILON);
        assert!(PackReport::default().compression_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn test_extraction_report_record() {
        let mut report = ExtractionReport::default();
        report.record(PathBuf::from("/d/a"), EntryType::Directory);
        report.record(PathBuf::from("/d/a/f"), EntryType::File);
        report.record(
            PathBuf::from("/d/a/l"),
            EntryType::Symlink {
                target: PathBuf::from("f"),
            },
        );

        assert_eq!(report.total_items(), 3);
        assert_eq!(report.symlinks_created, 1);
        let paths: Vec<_> = report.paths().collect();
        assert_eq!(paths[0], Path::new("/d/a"));
    }

    #[test]
    fn test_download_summary_without_open() {
        let report = download_report("/d", OpenOutcome::NotRequested);
        assert_eq!(
            report.summary(),
            "Successfully downloaded /Users/vagrant/out from machine m-1 to /d"
        );
    }

    #[test]
    fn test_download_note_for_item_and_folder() {
        let item = download_report("/d/app.app", OpenOutcome::Opened);
        assert_eq!(item.note().as_deref(), Some("Item opened automatically."));

        let folder = download_report("/d", OpenOutcome::Failed("no handler".into()));
        assert_eq!(
            folder.note().as_deref(),
            Some("(Note: Failed to automatically open folder: no handler)")
        );
        assert!(folder.summary().ends_with("open folder: no handler)"));
    }

    #[test]
    fn test_item_open_failure_note() {
        let item = download_report("/d/app.app", OpenOutcome::Failed("no handler".into()));
        assert_eq!(
            item.note().as_deref(),
            Some("(Note: Failed to automatically open: no handler)")
        );
    }

    #[test]
    fn test_record_repeated_path_counts_once() {
        let mut report = ExtractionReport::default();
        report.record(PathBuf::from("/d/a.txt"), EntryType::File);
        report.record(PathBuf::from("/d/a.txt"), EntryType::File);
        report.record(PathBuf::from("/d/dir"), EntryType::Directory);

        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.total_items(), report.paths().count());
    }
}
