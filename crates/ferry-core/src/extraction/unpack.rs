//! Secure tar+gzip unpacking.
//!
//! Every entry is validated against the destination root before anything is
//! written for it. Entries already written when a violation is found stay on
//! disk; nothing after the violation is written.

use crate::Result;
use crate::TransferError;
use crate::extraction::filters::is_metadata_noise;
use crate::report::ExtractionReport;
use crate::types::DestDir;
use crate::types::EntryType;
use crate::types::SafePath;
use crate::types::SafeSymlink;
use flate2::read::GzDecoder;
use std::fs::DirBuilder;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Permission bits kept from archive headers; setuid, setgid and sticky are
/// dropped.
const MODE_MASK: u32 = 0o777;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Unpacks a gzip-compressed tar archive under `destination`.
///
/// The destination is created, with missing parents, if absent. Re-running
/// on the same root is safe: files are truncated, directories reused and
/// symlinks replaced.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::unpack;
/// use std::path::Path;
///
/// let bytes = std::fs::read("bundle.tar.gz")?;
/// let report = unpack(&bytes, Path::new("/tmp/out"))?;
/// for path in report.paths() {
///     println!("{}", path.display());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns:
/// - `TransferError::Access` if the destination cannot be prepared
/// - `TransferError::Format` for a malformed gzip or tar stream
/// - `TransferError::PathTraversal` or `TransferError::SymlinkEscape` when an
///   entry would land outside the destination
/// - `TransferError::Io` if writing to disk fails
pub fn unpack(archive_bytes: &[u8], destination: &Path) -> Result<ExtractionReport> {
    let start = std::time::Instant::now();
    let dest = DestDir::create(destination)?;
    let mut report = ExtractionReport {
        root: dest.as_path().to_path_buf(),
        ..ExtractionReport::default()
    };
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut directory_modes = Vec::new();

    let mut archive = tar::Archive::new(GzDecoder::new(archive_bytes));
    let entries = archive.entries().map_err(format_error)?;

    for entry in entries {
        let mut entry = entry.map_err(format_error)?;
        let entry_path = entry.path().map_err(format_error)?.into_owned();

        if is_metadata_noise(&entry_path) {
            tracing::debug!(entry = %entry_path.display(), "skipping metadata entry");
            report.noise_skipped += 1;
            continue;
        }

        let safe_path = SafePath::validate(&entry_path, &dest)?;
        let target = dest.join(&safe_path);
        let mode = entry.header().mode().map_err(format_error)? & MODE_MASK;

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                if !safe_path.is_root() {
                    create_directory(&target)?;
                    directory_modes.push((target.clone(), mode));
                }
                report.record(target, EntryType::Directory);
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                let written = write_file(&mut entry, &target, mode, &mut buffer)?;
                report.bytes_written += written;
                report.record(target, EntryType::File);
            }
            tar::EntryType::Symlink => {
                let link_target = entry
                    .link_name()
                    .map_err(format_error)?
                    .ok_or_else(|| {
                        TransferError::Format(format!(
                            "symlink entry without target: {}",
                            entry_path.display()
                        ))
                    })?
                    .into_owned();
                let symlink = SafeSymlink::validate(&safe_path, &link_target, &dest)?;
                if create_symlink(&symlink, &target)? {
                    report.record(
                        target,
                        EntryType::Symlink {
                            target: link_target,
                        },
                    );
                } else {
                    report.unsupported_skipped += 1;
                }
            }
            other => {
                tracing::debug!(
                    entry = %entry_path.display(),
                    kind = ?other,
                    "skipping unsupported entry type"
                );
                report.unsupported_skipped += 1;
            }
        }
    }

    // Children are in place; read-only directories can be sealed now.
    apply_directory_modes(&directory_modes)?;
    report.duration = start.elapsed();

    tracing::debug!(
        destination = %dest.as_path().display(),
        items = report.total_items(),
        skipped = report.total_skipped(),
        bytes_written = report.bytes_written,
        "unpacked archive"
    );

    Ok(report)
}

fn format_error(err: std::io::Error) -> TransferError {
    TransferError::Format(err.to_string())
}

/// Creates a directory, or makes an existing one writable by its owner so a
/// re-run can refill it. Recorded modes are applied once every entry is in.
fn create_directory(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = meta.permissions().mode();
                if mode & 0o700 != 0o700 {
                    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode | 0o700))?;
                }
            }
            Ok(())
        }
        _ => {
            DirBuilder::new().recursive(true).create(path)?;
            Ok(())
        }
    }
}

/// Applies recorded directory modes, deepest entries first.
fn apply_directory_modes(modes: &[(PathBuf, u32)]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for (path, mode) in modes.iter().rev() {
            if std::fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir()) {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(*mode))?;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = modes;
    Ok(())
}

/// Writes one regular file, replacing a symlink or a read-only file that
/// occupies its path.
///
/// Read failures come from the archive stream and are reported as format
/// errors; write failures are I/O errors.
fn write_file<R: Read>(reader: &mut R, path: &Path, mode: u32, buffer: &mut [u8]) -> Result<u64> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if std::fs::symlink_metadata(path).is_ok_and(|meta| {
        meta.file_type().is_symlink() || (meta.is_file() && meta.permissions().readonly())
    }) {
        std::fs::remove_file(path)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let file = options.open(path)?;
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, file);
    let mut written = 0u64;

    loop {
        let n = reader.read(buffer).map_err(format_error)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
        written += n as u64;
    }
    writer.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(written)
}

/// Creates a validated symlink, replacing any file or link at its path.
///
/// Returns `false` when the platform cannot create symlinks.
fn create_symlink(symlink: &SafeSymlink, link_path: &Path) -> Result<bool> {
    #[cfg(unix)]
    {
        if let Some(parent) = link_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::symlink_metadata(link_path).is_ok_and(|meta| !meta.is_dir()) {
            std::fs::remove_file(link_path)?;
        }

        std::os::unix::fs::symlink(symlink.target_path(), link_path)?;
        Ok(true)
    }

    #[cfg(not(unix))]
    {
        tracing::warn!(
            link = %symlink.link_path().display(),
            "symlinks are not supported on this platform"
        );
        let _ = link_path;
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TarTestBuilder;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unpack_files_and_directories() {
        let bytes = TarTestBuilder::new()
            .add_directory("proj/")
            .add_file("proj/readme.md", b"# hi")
            .add_file("proj/src/main.go", b"package main")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();
        let root = temp.path().canonicalize().unwrap();

        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 16);
        assert_eq!(
            fs::read_to_string(root.join("proj/src/main.go")).unwrap(),
            "package main"
        );
        assert!(report.paths().all(|p| p.starts_with(&root)));
    }

    #[test]
    fn test_unpack_creates_missing_destination() {
        let bytes = TarTestBuilder::new().add_file("a.txt", b"a").build_gz();
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("deep/new/dest");

        unpack(&bytes, &dest).unwrap();
        assert!(dest.join("a.txt").is_file());
    }

    #[test]
    fn test_unpack_skips_apple_double() {
        let bytes = TarTestBuilder::new()
            .add_file("proj/main.go", b"package main")
            .add_file("proj/._main.go", b"\x00\x05\x16\x07")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();

        assert_eq!(report.noise_skipped, 1);
        assert!(!temp.path().join("proj/._main.go").exists());
        assert!(report.paths().all(|p| !is_metadata_noise(p)));
    }

    #[test]
    fn test_unpack_rejects_traversal_and_stops() {
        let bytes = TarTestBuilder::new()
            .add_file("first.txt", b"1")
            .add_raw_file("../escape.txt", b"evil")
            .add_file("later.txt", b"2")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        let err = unpack(&bytes, &dest).unwrap_err();

        assert!(matches!(err, TransferError::PathTraversal { .. }));
        assert!(dest.join("first.txt").exists());
        assert!(!temp.path().join("escape.txt").exists());
        assert!(!dest.join("later.txt").exists());
    }

    #[test]
    fn test_unpack_malformed_is_format_error() {
        let temp = TempDir::new().unwrap();
        let err = unpack(b"definitely not gzip", temp.path()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }

    #[test]
    fn test_unpack_skips_hard_links() {
        let bytes = TarTestBuilder::new()
            .add_file("a.txt", b"a")
            .add_hardlink("b.txt", "a.txt")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();

        assert_eq!(report.unsupported_skipped, 1);
        assert!(!temp.path().join("b.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_strips_special_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let bytes = TarTestBuilder::new()
            .add_file_with_mode("tool", b"#!/bin/sh", 0o4755)
            .build_gz();

        let temp = TempDir::new().unwrap();
        unpack(&bytes, temp.path()).unwrap();

        let mode = fs::metadata(temp.path().join("tool")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_symlink_inside() {
        let bytes = TarTestBuilder::new()
            .add_file("src/main.go", b"package main")
            .add_symlink("link", "src/main.go")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();

        assert_eq!(report.symlinks_created, 1);
        assert_eq!(
            fs::read_link(temp.path().join("link")).unwrap(),
            PathBuf::from("src/main.go")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_file_replaces_existing_symlink() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let victim = outside.path().join("victim.txt");
        fs::write(&victim, "original").unwrap();
        std::os::unix::fs::symlink(&victim, temp.path().join("data.txt")).unwrap();

        let bytes = TarTestBuilder::new().add_file("data.txt", b"fresh").build_gz();
        unpack(&bytes, temp.path()).unwrap();

        let meta = fs::symlink_metadata(temp.path().join("data.txt")).unwrap();
        assert!(meta.file_type().is_file());
        assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
    }

    #[test]
    fn test_unpack_root_entry_recorded_as_destination() {
        let bytes = TarTestBuilder::new()
            .add_directory("./")
            .add_file("./a.txt", b"a")
            .build_gz();

        let temp = TempDir::new().unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();
        let root = temp.path().canonicalize().unwrap();

        assert!(report.paths().any(|p| p == root));
        assert!(root.join("a.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_read_only_entries_twice() {
        use std::os::unix::fs::PermissionsExt;

        let bytes = TarTestBuilder::new()
            .add_directory_with_mode("sealed/", 0o555)
            .add_file_with_mode("sealed/object", b"blob", 0o444)
            .add_file_with_mode("vendored.txt", b"v1", 0o444)
            .build_gz();

        let temp = TempDir::new().unwrap();
        unpack(&bytes, temp.path()).unwrap();
        let report = unpack(&bytes, temp.path()).unwrap();
        assert_eq!(report.files_extracted, 2);

        let sealed = temp.path().join("sealed");
        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&sealed), 0o555);
        assert_eq!(mode(&sealed.join("object")), 0o444);
        assert_eq!(fs::read_to_string(sealed.join("object")).unwrap(), "blob");
        assert_eq!(fs::read_to_string(temp.path().join("vendored.txt")).unwrap(), "v1");

        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unpack_rewrites_read_only_file_contents() {
        let first = TarTestBuilder::new()
            .add_file_with_mode("config", b"old contents", 0o444)
            .build_gz();
        let second = TarTestBuilder::new()
            .add_file_with_mode("config", b"new", 0o444)
            .build_gz();

        let temp = TempDir::new().unwrap();
        unpack(&first, temp.path()).unwrap();
        unpack(&second, temp.path()).unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("config")).unwrap(), "new");
    }
}
