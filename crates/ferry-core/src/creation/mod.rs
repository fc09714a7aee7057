//! Archive packing.
//!
//! The walker turns a source path into an ordered list of entries; the tar
//! module serializes them into a gzip-compressed tar stream in memory.

pub mod tar;
pub mod walker;

pub use tar::ArchiveStream;
pub use tar::pack;
pub use walker::SourceEntry;
pub use walker::is_archivable;
