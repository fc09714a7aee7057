//! Archive unpacking.
//!
//! [`unpack`] materializes a tar+gzip stream under a destination root,
//! skipping platform metadata noise and refusing any entry that would land
//! outside the root.

pub mod filters;
pub mod unpack;

pub use filters::is_metadata_noise;
pub use unpack::unpack;
