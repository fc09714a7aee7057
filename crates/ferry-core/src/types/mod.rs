//! Validated path types used while unpacking.
//!
//! An archive entry only reaches the filesystem after its path went through
//! [`SafePath::validate`] (and, for links, [`SafeSymlink::validate`]) against
//! a [`DestDir`]. There are no `From<PathBuf>` conversions for these types.

pub mod dest_dir;
pub mod entry_type;
pub mod safe_path;
pub mod safe_symlink;

pub use dest_dir::DestDir;
pub use entry_type::EntryType;
pub use entry_type::ExtractedPath;
pub use safe_path::SafePath;
pub use safe_symlink::SafeSymlink;
