//! Destination root for unpacking.

use crate::Result;
use crate::TransferError;
use std::path::Path;
use std::path::PathBuf;

/// The directory under which every unpacked path must resolve.
///
/// Construction creates the directory (and missing parents) when absent,
/// verifies it is a writable directory and stores its canonical absolute
/// form, so containment checks compare canonical paths on both sides.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/downloads")?;
/// println!("Unpacking into: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates (if needed) and validates the destination directory.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Access` if:
    /// - The directory cannot be created
    /// - The path exists but is not a directory
    /// - The path cannot be canonicalized
    /// - The directory is not writable (on Unix)
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let access = |source: std::io::Error| TransferError::Access {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(path).map_err(access)?;

        if !path.is_dir() {
            return Err(access(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination is not a directory",
            )));
        }

        let canonical = path.canonicalize().map_err(access)?;

        #[cfg(unix)]
        {
            use std::ffi::CString;
            use std::os::unix::ffi::OsStrExt;

            let path_cstring = CString::new(canonical.as_os_str().as_bytes()).map_err(|_| {
                access(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path contains null byte",
                ))
            })?;

            // SAFETY: access() only reads the NUL-terminated string, which
            // outlives the call.
            #[allow(unsafe_code)]
            let result = unsafe { libc::access(path_cstring.as_ptr(), libc::W_OK) };

            if result != 0 {
                return Err(access(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "directory is not writable",
                )));
            }
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical destination path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated entry path to the destination.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &super::SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }

    /// Checks that the nearest existing ancestor of `path` still resolves
    /// inside the destination once symlinks are followed.
    ///
    /// Catches writes redirected through a symlinked intermediate directory
    /// that a purely lexical check cannot see.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::PathTraversal` (reporting `entry`) when the
    /// resolved ancestor lies outside, or `TransferError::Io` if
    /// canonicalization fails for a reason other than a missing path.
    pub fn verify_ancestors(&self, path: &Path, entry: &Path) -> Result<()> {
        let mut current = path.parent();

        while let Some(ancestor) = current {
            match ancestor.canonicalize() {
                Ok(canonical) => {
                    if canonical.starts_with(&self.0) {
                        return Ok(());
                    }
                    return Err(TransferError::PathTraversal {
                        path: entry.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    current = ancestor.parent();
                }
                Err(e) => return Err(TransferError::Io(e)),
            }
        }

        Err(TransferError::PathTraversal {
            path: entry.to_path_buf(),
        })
    }
}

impl AsRef<Path> for DestDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
