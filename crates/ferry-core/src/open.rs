//! Hand-off to the platform's default handler.

use std::path::Path;

/// Opens a local path with whatever the desktop associates with it.
///
/// Failures are advisory: callers report them and carry on.
pub trait Opener {
    /// Opens `path`, returning a human-readable reason on failure.
    fn open(&self, path: &Path) -> std::result::Result<(), String>;
}

/// [`Opener`] backed by `open`, `xdg-open` or `start` depending on the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> std::result::Result<(), String> {
        tracing::debug!(path = %path.display(), "opening with system handler");
        open::that(path).map_err(|e| e.to_string())
    }
}
