//! Validated symlink type.

use crate::Result;
use crate::TransferError;
use std::io::ErrorKind;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use super::SafePath;
use super::safe_path::normalize_within;

/// A symlink entry whose target stays inside the destination root.
///
/// The target is walked from the directory the link will actually live in,
/// following links already on disk, and must end inside the root. A `..`
/// may only step out of a real directory below the root: stepping out of a
/// symlink, or out of a component that does not exist yet, is refused
/// because a later entry could change where it lands.
/// The stored target is the recorded string, untouched.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::types::DestDir;
/// use ferry_core::types::SafePath;
/// use ferry_core::types::SafeSymlink;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/out")?;
/// let link = SafePath::validate(Path::new("proj/link"), &dest)?;
///
/// let symlink = SafeSymlink::validate(&link, Path::new("src/main.go"), &dest)?;
/// assert_eq!(symlink.target_path(), Path::new("src/main.go"));
///
/// assert!(SafeSymlink::validate(&link, Path::new("../../etc/passwd"), &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSymlink {
    link_path: PathBuf,
    target_path: PathBuf,
}

impl SafeSymlink {
    /// Validates a symlink entry.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject empty and absolute targets
    /// 2. Reject targets that climb above the root lexically
    /// 3. Resolve the link's parent directory on disk
    /// 4. Walk the target from there, following existing links, and require
    ///    the result to stay inside the destination
    ///
    /// # Errors
    ///
    /// Returns `TransferError::SymlinkEscape` if the target is absolute or
    /// resolves outside the destination root, or `TransferError::Io` if the
    /// filesystem cannot be inspected.
    pub fn validate(link: &SafePath, target: &Path, dest: &DestDir) -> Result<Self> {
        let escape = || TransferError::SymlinkEscape {
            path: link.as_path().to_path_buf(),
            target: target.to_path_buf(),
        };

        if target.has_root() || target.as_os_str().is_empty() {
            return Err(escape());
        }

        let link_parent = link.as_path().parent().unwrap_or_else(|| Path::new(""));
        normalize_within(&link_parent.join(target)).ok_or_else(escape)?;

        let start = physical_dir(&dest.join(link), dest)?;
        let resolved = walk_target(start, target, dest)?.ok_or_else(escape)?;
        if !resolved.starts_with(dest.as_path()) {
            return Err(escape());
        }

        Ok(Self {
            link_path: link.as_path().to_path_buf(),
            target_path: target.to_path_buf(),
        })
    }

    /// Returns the link path, relative to the destination.
    #[inline]
    #[must_use]
    pub fn link_path(&self) -> &Path {
        &self.link_path
    }

    /// Returns the target exactly as recorded in the archive.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}

/// Returns the directory that will hold `link_full` once its missing parents
/// are created: the canonical nearest existing ancestor plus the missing
/// names.
fn physical_dir(link_full: &Path, dest: &DestDir) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = link_full.parent();

    while let Some(dir) = current {
        match dir.canonicalize() {
            Ok(mut canonical) => {
                for name in missing.iter().rev() {
                    canonical.push(name);
                }
                return Ok(canonical);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(name) = dir.file_name() {
                    missing.push(name.to_os_string());
                }
                current = dir.parent();
            }
            Err(e) => return Err(TransferError::Io(e)),
        }
    }

    Ok(dest.as_path().to_path_buf())
}

/// Walks `target` from `start`, following links already on disk.
///
/// Returns `None` when a `..` would leave the root, or would step out of a
/// link or a path that does not exist yet.
fn walk_target(start: PathBuf, target: &Path, dest: &DestDir) -> Result<Option<PathBuf>> {
    let mut current = start;
    // `current` names a real directory, so `..` from it is fixed.
    let mut settled = true;

    for component in target.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !settled || current == dest.as_path() || !current.pop() {
                    return Ok(None);
                }
            }
            Component::Normal(name) => {
                current.push(name);
                if !settled {
                    continue;
                }
                match std::fs::symlink_metadata(&current) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        settled = false;
                        match current.canonicalize() {
                            Ok(canonical) => current = canonical,
                            Err(e) if e.kind() == ErrorKind::NotFound => {}
                            Err(e) => return Err(TransferError::Io(e)),
                        }
                    }
                    Ok(meta) => settled = meta.is_dir(),
                    Err(e) if e.kind() == ErrorKind::NotFound => settled = false,
                    Err(e) => return Err(TransferError::Io(e)),
                }
            }
            Component::RootDir | Component::Prefix(_) => return Ok(None),
        }
    }

    Ok(Some(current))
}
