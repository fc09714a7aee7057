//! Source tree walking for the packer.
//!
//! Produces the entries of a source path in archive order: depth-first,
//! parents before children, siblings sorted by file name. Symlinks are never
//! followed.

use crate::Result;
use crate::TransferError;
use crate::types::EntryType;
use std::ffi::OsString;
use std::fs::FileType;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// One filesystem object seen while packing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Full filesystem path.
    pub path: PathBuf,

    /// Relative path inside the archive.
    pub archive_path: PathBuf,

    /// Kind of entry; symlinks carry their recorded target.
    pub entry_type: EntryType,

    /// Size in bytes (0 for directories and symlinks).
    pub size: u64,

    /// Permission bits, including setuid/setgid/sticky.
    pub mode: u32,

    /// Modification time in seconds since the epoch.
    pub mtime: u64,
}

/// Everything the walker found under a source path.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    /// Archivable entries in archive order.
    pub entries: Vec<SourceEntry>,

    /// Device nodes, sockets and FIFOs that were left out.
    pub skipped: Vec<PathBuf>,
}

/// Returns `true` for the kinds the archive can carry.
///
/// Device nodes, sockets and FIFOs are not archivable.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::creation::walker::is_archivable;
///
/// let meta = std::fs::symlink_metadata("Cargo.toml").unwrap();
/// assert!(is_archivable(&meta.file_type()));
/// ```
#[must_use]
pub fn is_archivable(file_type: &FileType) -> bool {
    file_type.is_file() || file_type.is_dir() || file_type.is_symlink()
}

/// Walks `source` and collects its entries.
///
/// For a file or symlink source the tree holds exactly one entry named by
/// the source's base name. For a directory, `include_root_dir` decides
/// whether entries are rooted at the directory's base name or whether its
/// children become top-level entries.
///
/// # Errors
///
/// Returns:
/// - `TransferError::Access` if the source cannot be stat'ed
/// - `TransferError::UnsupportedSource` if the source itself is not archivable
/// - `TransferError::Io` if any entry below it cannot be read
pub fn collect_entries(source: &Path, include_root_dir: bool) -> Result<SourceTree> {
    let metadata = std::fs::symlink_metadata(source).map_err(|e| TransferError::Access {
        path: source.to_path_buf(),
        source: e,
    })?;

    if !is_archivable(&metadata.file_type()) {
        return Err(TransferError::UnsupportedSource {
            path: source.to_path_buf(),
        });
    }

    let root_name = base_name(source);

    if !metadata.is_dir() {
        let name = root_name.ok_or_else(|| TransferError::Access {
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
        })?;
        let entry = build_entry(source, PathBuf::from(name), &metadata)?;
        return Ok(SourceTree {
            entries: vec![entry],
            skipped: Vec::new(),
        });
    }

    // A directory without a usable name ("/") can only be packed by contents.
    let prefix = if include_root_dir {
        root_name.map(PathBuf::from)
    } else {
        None
    };

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(usize::from(prefix.is_none()));

    let mut tree = SourceTree::default();

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(walk_error)?;

        if !is_archivable(&metadata.file_type()) {
            tracing::warn!(path = %path.display(), "skipping special file");
            tree.skipped.push(path.to_path_buf());
            continue;
        }

        let relative = path.strip_prefix(source).map_err(|_| {
            TransferError::Io(std::io::Error::other(format!(
                "walked path {} is not under {}",
                path.display(),
                source.display()
            )))
        })?;
        let archive_path = prefix
            .as_ref()
            .map_or_else(|| relative.to_path_buf(), |p| p.join(relative));

        tree.entries.push(build_entry(path, archive_path, &metadata)?);
    }

    Ok(tree)
}

fn base_name(source: &Path) -> Option<OsString> {
    source
        .file_name()
        .map(ToOwned::to_owned)
        .or_else(|| {
            source
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(ToOwned::to_owned))
        })
}

fn build_entry(path: &Path, archive_path: PathBuf, metadata: &Metadata) -> Result<SourceEntry> {
    let file_type = metadata.file_type();
    let entry_type = if file_type.is_symlink() {
        EntryType::Symlink {
            target: std::fs::read_link(path)?,
        }
    } else if file_type.is_dir() {
        EntryType::Directory
    } else {
        EntryType::File
    };

    let size = if entry_type.is_file() {
        metadata.len()
    } else {
        0
    };

    Ok(SourceEntry {
        path: path.to_path_buf(),
        archive_path,
        entry_type,
        size,
        mode: permission_bits(metadata),
        mtime: modified_secs(metadata),
    })
}

fn walk_error(err: walkdir::Error) -> TransferError {
    let path = err.path().map(Path::to_path_buf);
    match err.into_io_error() {
        Some(io) => TransferError::Io(io),
        None => TransferError::Io(std::io::Error::other(format!(
            "filesystem loop detected at {}",
            path.unwrap_or_default().display()
        ))),
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

fn modified_secs(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn archive_paths(tree: &SourceTree) -> Vec<String> {
        tree.entries
            .iter()
            .map(|e| e.archive_path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let proj = temp.path().join("proj");
        fs::create_dir_all(proj.join("src")).unwrap();
        fs::write(proj.join("src/main.go"), "package main\n").unwrap();
        fs::write(proj.join("b.txt"), "b").unwrap();
        fs::write(proj.join("a.txt"), "a").unwrap();
        temp
    }

    #[test]
    fn test_single_file_uses_base_name() {
        let temp = sample_tree();
        let tree = collect_entries(&temp.path().join("proj/a.txt"), true).unwrap();
        assert_eq!(archive_paths(&tree), ["a.txt"]);
        assert_eq!(tree.entries[0].size, 1);
    }

    #[test]
    fn test_directory_with_root() {
        let temp = sample_tree();
        let tree = collect_entries(&temp.path().join("proj"), true).unwrap();
        assert_eq!(
            archive_paths(&tree),
            ["proj", "proj/a.txt", "proj/b.txt", "proj/src", "proj/src/main.go"]
        );
        assert!(tree.entries[0].entry_type.is_directory());
    }

    #[test]
    fn test_directory_contents_only() {
        let temp = sample_tree();
        let tree = collect_entries(&temp.path().join("proj"), false).unwrap();
        assert_eq!(
            archive_paths(&tree),
            ["a.txt", "b.txt", "src", "src/main.go"]
        );
    }

    #[test]
    fn test_missing_source_is_access_error() {
        let temp = TempDir::new().unwrap();
        let err = collect_entries(&temp.path().join("nope"), true).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Access);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_recorded_not_followed() {
        let temp = sample_tree();
        let proj = temp.path().join("proj");
        std::os::unix::fs::symlink("src/main.go", proj.join("link")).unwrap();

        let tree = collect_entries(&proj, false).unwrap();
        let link = tree
            .entries
            .iter()
            .find(|e| e.archive_path == Path::new("link"))
            .unwrap();
        assert_eq!(
            link.entry_type,
            EntryType::Symlink {
                target: PathBuf::from("src/main.go")
            }
        );
        assert_eq!(link.size, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_skipped() {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let temp = sample_tree();
        let proj = temp.path().join("proj");
        let fifo = proj.join("pipe");
        let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
        #[allow(unsafe_code)]
        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
        assert_eq!(rc, 0);

        let tree = collect_entries(&proj, false).unwrap();
        assert_eq!(tree.skipped, vec![fifo]);
        assert!(!archive_paths(&tree).contains(&"pipe".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_source_is_unsupported() {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let fifo = temp.path().join("pipe");
        let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
        #[allow(unsafe_code)]
        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
        assert_eq!(rc, 0);

        let err = collect_entries(&fifo, true).unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedSource { .. }));
    }
}
