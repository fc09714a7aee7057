//! Entry filters applied before anything is written.

use std::path::Path;

/// Prefix of macOS AppleDouble sidecar files.
const APPLE_DOUBLE_PREFIX: &str = "._";

/// Returns `true` for platform metadata entries that must never be written.
///
/// Matches AppleDouble sidecars: any entry whose base name starts with `._`,
/// wherever it sits in the tree.
///
/// # Examples
///
/// ```
/// use ferry_core::extraction::filters::is_metadata_noise;
/// use std::path::Path;
///
/// assert!(is_metadata_noise(Path::new("proj/._main.go")));
/// assert!(!is_metadata_noise(Path::new("proj/main.go")));
/// assert!(!is_metadata_noise(Path::new("._dir/main.go")));
/// ```
#[must_use]
pub fn is_metadata_noise(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().starts_with(APPLE_DOUBLE_PREFIX.as_bytes()))
}
