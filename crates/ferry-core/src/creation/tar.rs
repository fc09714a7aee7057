//! tar+gzip packing into an in-memory buffer.

use crate::Result;
use crate::config::TransferConfig;
use crate::creation::walker::SourceEntry;
use crate::creation::walker::collect_entries;
use crate::report::PackReport;
use crate::types::EntryType;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tar::Builder;
use tar::Header;

/// A finished gzip-compressed tar archive held in memory.
///
/// The stream is complete and readable by `tar -xzf`; a failed pack never
/// yields a partial one.
#[derive(Debug, Clone)]
pub struct ArchiveStream {
    bytes: Vec<u8>,
    report: PackReport,
}

impl ArchiveStream {
    /// Returns the compressed archive bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the size of the compressed archive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the statistics collected while packing.
    #[must_use]
    pub fn report(&self) -> &PackReport {
        &self.report
    }

    /// Splits into the raw bytes and the pack report.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, PackReport) {
        (self.bytes, self.report)
    }
}

/// Packs `source` into a tar+gzip archive.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::TransferConfig;
/// use ferry_core::pack;
/// use std::path::Path;
///
/// let config = TransferConfig::default();
/// let archive = pack(Path::new("./build"), true, &config)?;
/// println!("{} entries, {} bytes", archive.report().total_entries(), archive.len());
/// # Ok::<(), ferry_core::TransferError>(())
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The source cannot be stat'ed (`Access`)
/// - The source is a device, socket or FIFO (`UnsupportedSource`)
/// - Any file cannot be read while packing (`Io`)
pub fn pack(source: &Path, include_root_dir: bool, config: &TransferConfig) -> Result<ArchiveStream> {
    let start = std::time::Instant::now();
    let tree = collect_entries(source, include_root_dir)?;

    let level = compression_level_to_flate2(config.compression_level);
    let encoder = GzEncoder::new(Vec::new(), level);
    let mut builder = Builder::new(encoder);
    let mut report = PackReport {
        special_skipped: tree.skipped.len(),
        ..PackReport::default()
    };

    for entry in &tree.entries {
        match &entry.entry_type {
            EntryType::File => add_file(&mut builder, entry, &mut report)?,
            EntryType::Directory => add_directory(&mut builder, entry, &mut report)?,
            EntryType::Symlink { target } => {
                add_symlink(&mut builder, entry, target, &mut report)?;
            }
        }
    }

    builder.finish()?;
    let mut encoder = builder.into_inner()?;
    encoder.flush()?;
    let bytes = encoder.finish()?;

    report.bytes_compressed = bytes.len() as u64;
    report.duration = start.elapsed();

    tracing::debug!(
        source = %source.display(),
        entries = report.total_entries(),
        skipped = report.special_skipped,
        bytes_read = report.bytes_read,
        bytes_compressed = report.bytes_compressed,
        "packed archive"
    );

    Ok(ArchiveStream { bytes, report })
}

fn base_header(entry: &SourceEntry, kind: tar::EntryType) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(entry.mode);
    header.set_mtime(entry.mtime);
    header.set_uid(0);
    header.set_gid(0);
    header.set_size(0);
    header
}

fn add_file<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    report: &mut PackReport,
) -> Result<()> {
    let mut file = File::open(&entry.path)?;
    let size = file.metadata()?.len();

    let mut header = base_header(entry, tar::EntryType::Regular);
    header.set_size(size);
    header.set_cksum();

    builder.append_data(&mut header, &entry.archive_path, &mut file)?;

    report.files_added += 1;
    report.bytes_read += size;
    Ok(())
}

fn add_directory<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    report: &mut PackReport,
) -> Result<()> {
    let mut header = base_header(entry, tar::EntryType::Directory);
    header.set_cksum();

    builder.append_data(&mut header, &entry.archive_path, std::io::empty())?;

    report.directories_added += 1;
    Ok(())
}

fn add_symlink<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    target: &Path,
    report: &mut PackReport,
) -> Result<()> {
    let mut header = base_header(entry, tar::EntryType::Symlink);
    header.set_cksum();

    builder.append_link(&mut header, &entry.archive_path, target)?;

    report.symlinks_added += 1;
    Ok(())
}

/// Converts compression level (1-9) to flate2 compression level.
fn compression_level_to_flate2(level: u8) -> flate2::Compression {
    flate2::Compression::new(u32::from(level.clamp(1, 9)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn list_entries(bytes: &[u8]) -> Vec<(String, tar::EntryType)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                let name = e.path().unwrap().to_string_lossy().trim_end_matches('/').to_string();
                (name, e.header().entry_type())
            })
            .collect()
    }

    #[test]
    fn test_pack_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.txt");
        fs::write(&file, "hello").unwrap();

        let archive = pack(&file, true, &TransferConfig::default()).unwrap();
        let entries = list_entries(archive.as_bytes());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "report.txt");
        assert_eq!(archive.report().files_added, 1);
        assert_eq!(archive.report().bytes_read, 5);
        assert_eq!(archive.report().bytes_compressed, archive.len() as u64);
    }

    #[test]
    fn test_pack_directory_emits_directory_entries() {
        let temp = TempDir::new().unwrap();
        let proj = temp.path().join("proj");
        fs::create_dir_all(proj.join("src")).unwrap();
        fs::write(proj.join("src/main.go"), "package main").unwrap();

        let archive = pack(&proj, true, &TransferConfig::default()).unwrap();
        let entries = list_entries(archive.as_bytes());

        assert_eq!(entries[0], ("proj".to_string(), tar::EntryType::Directory));
        assert_eq!(entries[1], ("proj/src".to_string(), tar::EntryType::Directory));
        assert_eq!(entries[2], ("proj/src/main.go".to_string(), tar::EntryType::Regular));
        assert_eq!(archive.report().directories_added, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_pack_contents_only_with_symlink() {
        let temp = TempDir::new().unwrap();
        let proj = temp.path().join("proj");
        fs::create_dir_all(proj.join("src")).unwrap();
        fs::write(proj.join("src/main.go"), "package main").unwrap();
        std::os::unix::fs::symlink("src/main.go", proj.join("link")).unwrap();

        let archive = pack(&proj, false, &TransferConfig::default()).unwrap();
        let names: Vec<_> = list_entries(archive.as_bytes())
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, ["link", "src", "src/main.go"]);

        let mut tar = tar::Archive::new(GzDecoder::new(archive.as_bytes()));
        let link = tar.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(link.header().entry_type(), tar::EntryType::Symlink);
        assert_eq!(
            link.link_name().unwrap().unwrap().as_ref(),
            Path::new("src/main.go")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_pack_records_mode_and_zero_ownership() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let archive = pack(&script, true, &TransferConfig::default()).unwrap();
        let mut tar = tar::Archive::new(GzDecoder::new(archive.as_bytes()));
        let mut entry = tar.entries().unwrap().next().unwrap().unwrap();

        assert_eq!(entry.header().mode().unwrap() & 0o777, 0o755);
        assert_eq!(entry.header().uid().unwrap(), 0);
        assert_eq!(entry.header().gid().unwrap(), 0);

        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "#!/bin/sh\n");
    }

    #[test]
    fn test_pack_is_deterministic_in_order() {
        let temp = TempDir::new().unwrap();
        let proj = temp.path().join("proj");
        fs::create_dir_all(&proj).unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::write(proj.join(name), name).unwrap();
        }

        let first = list_entries(pack(&proj, false, &TransferConfig::default()).unwrap().as_bytes());
        let second = list_entries(pack(&proj, false, &TransferConfig::default()).unwrap().as_bytes());
        assert_eq!(first, second);
        assert_eq!(first[0].0, "alpha");
    }

    #[test]
    fn test_pack_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = pack(&temp.path().join("missing"), true, &TransferConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Access);
    }

    #[test]
    fn test_compression_level_to_flate2() {
        assert_eq!(compression_level_to_flate2(1).level(), 1);
        assert_eq!(compression_level_to_flate2(9).level(), 9);
        assert_eq!(
            compression_level_to_flate2(6).level(),
            flate2::Compression::default().level()
        );
    }
}
