//! Entry kinds shared by the packer and the unpacker.

use std::path::Path;
use std::path::PathBuf;

/// Kind of filesystem object carried by an archive entry.
///
/// # Examples
///
/// ```
/// use ferry_core::types::EntryType;
/// use std::path::PathBuf;
///
/// let link = EntryType::Symlink {
///     target: PathBuf::from("src/main.go"),
/// };
/// assert!(link.is_symlink());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryType {
    /// Regular file.
    File,

    /// Directory.
    Directory,

    /// Symbolic link, with the target exactly as recorded.
    Symlink {
        /// Link target; not followed, not rewritten.
        target: PathBuf,
    },
}

impl EntryType {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symlink.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink { .. })
    }

    /// Short lowercase label used in logs and JSON output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink { .. } => "symlink",
        }
    }
}

/// An absolute local path written during unpacking, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtractedPath {
    /// Absolute path under the destination root.
    pub path: PathBuf,

    /// What was written there.
    pub entry_type: EntryType,
}

impl ExtractedPath {
    /// Creates a new extracted path record.
    #[must_use]
    pub fn new(path: PathBuf, entry_type: EntryType) -> Self {
        Self { path, entry_type }
    }

    /// Returns the written path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}
