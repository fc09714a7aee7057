//! Archive transfer between a local filesystem and a remote machine.
//!
//! `ferry-core` packs a file or directory tree into a tar+gzip stream,
//! pushes it to a remote machine through a signed-URL upload protocol, and
//! fetches and safely unpacks archives coming back, refusing any entry that
//! would land outside the destination.
//!
//! # Examples
//!
//! ```no_run
//! use ferry_core::TransferConfig;
//! use ferry_core::pack;
//! use ferry_core::unpack;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransferConfig::default();
//! let archive = pack(Path::new("./project"), true, &config)?;
//!
//! let report = unpack(archive.as_bytes(), Path::new("/tmp/copy"))?;
//! println!("Unpacked {} entries", report.total_items());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod creation;
pub mod error;
pub mod extraction;
pub mod open;
pub mod protocol;
pub mod report;
pub mod resolve;
#[doc(hidden)]
pub mod test_utils;
pub mod types;

pub use config::TransferConfig;
pub use creation::ArchiveStream;
pub use creation::pack;
pub use error::ErrorKind;
pub use error::PhaseExt;
pub use error::Result;
pub use error::TransferError;
pub use error::TransferPhase;
pub use extraction::unpack;
pub use report::DownloadReport;
pub use report::ExtractionReport;
pub use report::OpenOutcome;
pub use report::PackReport;
pub use report::UploadReport;
pub use resolve::resolve;
pub use types::DestDir;
pub use types::EntryType;
pub use types::ExtractedPath;
