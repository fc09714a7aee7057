//! Validated entry path type for unpacking.

use crate::Result;
use crate::TransferError;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// An archive entry path that stays inside the destination root.
///
/// The path is stored relative to the root and lexically normalized: `.`
/// segments are dropped and `..` segments are folded into their parent. An
/// empty `SafePath` denotes the root itself (`./` entries).
///
/// # Security Properties
///
/// - Can ONLY be constructed through validation
/// - NO `From<PathBuf>` implementation
/// - Never absolute, never contains `..`
///
/// # Examples
///
/// ```no_run
/// use ferry_core::types::DestDir;
/// use ferry_core::types::SafePath;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/out")?;
///
/// let safe = SafePath::validate(Path::new("proj/./src/../main.go"), &dest)?;
/// assert_eq!(safe.as_path(), Path::new("proj/main.go"));
///
/// assert!(SafePath::validate(Path::new("../etc/passwd"), &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates an entry path against the destination.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject absolute paths and drive prefixes
    /// 2. Normalize lexically; a `..` that would climb above the root fails
    /// 3. Verify the nearest existing ancestor of the joined path, with
    ///    symlinks resolved, is still inside the destination
    ///
    /// # Errors
    ///
    /// Returns `TransferError::PathTraversal` if any step fails.
    pub fn validate(path: &Path, dest: &DestDir) -> Result<Self> {
        let traversal = || TransferError::PathTraversal {
            path: path.to_path_buf(),
        };

        if path.has_root() {
            return Err(traversal());
        }

        let normalized = normalize_within(path).ok_or_else(traversal)?;
        if !normalized.as_os_str().is_empty() {
            let resolved = dest.as_path().join(&normalized);
            dest.verify_ancestors(&resolved, path)?;
        }

        Ok(Self(normalized))
    }

    /// Returns the path relative to the destination.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` when the entry denotes the destination root itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

/// Lexically normalizes a relative path, refusing to climb above its start.
///
/// Returns `None` when a `..` would leave the starting directory, or when the
/// path carries a root or prefix component.
pub(crate) fn normalize_within(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}
