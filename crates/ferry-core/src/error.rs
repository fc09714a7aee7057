//! Error types for packing, unpacking and transferring archives.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `TransferError`.
pub type Result<T> = std::result::Result<T, TransferError>;

/// Coarse classification of a [`TransferError`].
///
/// Callers that decide whether to retry, or which hint to show, match on the
/// kind instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source unreadable or destination unwritable.
    Access,
    /// Corrupt compressed stream or tar structure.
    Format,
    /// An entry or symlink target would escape the destination root.
    PathTraversal,
    /// Read, write or network failure not classified above.
    Io,
    /// The control API or object store answered with a failure status or an
    /// unparsable body.
    Protocol,
    /// Invalid local configuration.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access",
            Self::Format => "format",
            Self::PathTraversal => "path traversal",
            Self::Io => "I/O",
            Self::Protocol => "protocol",
            Self::Config => "configuration",
        };
        f.write_str(name)
    }
}

/// Step of an upload or download flow in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferPhase {
    /// Building the archive from the local source.
    Pack,
    /// Asking the control API to begin an upload session.
    Start,
    /// Sending the archive bytes to the signed write URL.
    Transmit,
    /// Asking the control API to finalize the upload session.
    Complete,
    /// Asking the control API for a signed read URL.
    Request,
    /// Fetching the archive bytes from the signed read URL.
    Fetch,
    /// Unpacking the fetched archive into the destination.
    Extract,
}

impl TransferPhase {
    /// Lowercase name used in messages and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pack => "pack",
            Self::Start => "start",
            Self::Transmit => "transmit",
            Self::Complete => "complete",
            Self::Request => "request",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while packing, unpacking or transferring archives.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The source path could not be read, or the destination is not writable.
    #[error("cannot access {path}: {source}")]
    Access {
        /// The path that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source is neither a regular file, a directory nor a symlink.
    #[error("unsupported source type (not a file, directory or symlink): {path}")]
    UnsupportedSource {
        /// The offending source path.
        path: PathBuf,
    },

    /// The compressed stream or the tar structure is corrupt.
    #[error("invalid archive: {0}")]
    Format(String),

    /// An archive entry would resolve outside the destination root.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry path as recorded in the archive.
        path: PathBuf,
    },

    /// A symlink entry points outside the destination root.
    #[error("symlink target outside destination: {path} -> {target}")]
    SymlinkEscape {
        /// The symlink entry path.
        path: PathBuf,
        /// The recorded link target.
        target: PathBuf,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side answered with a failure status or a malformed body.
    #[error("{}{message}", status_prefix(.status))]
    Protocol {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Response body or parse failure description.
        message: String,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// A flow step failed; wraps the underlying error with its phase.
    #[error("{phase} phase failed: {source}")]
    Phase {
        /// The step that failed.
        phase: TransferPhase,
        /// The underlying failure.
        #[source]
        source: Box<TransferError>,
    },
}

fn status_prefix(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |code| format!("unexpected status code {code}: "))
}

impl TransferError {
    /// Tags this error with the flow phase it happened in.
    ///
    /// An error that already carries a phase keeps its original one.
    #[must_use]
    pub fn in_phase(self, phase: TransferPhase) -> Self {
        match self {
            Self::Phase { .. } => self,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Returns the taxonomy bucket of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_core::{ErrorKind, TransferError, TransferPhase};
    ///
    /// let err = TransferError::Protocol { status: Some(500), message: "boom".into() }
    ///     .in_phase(TransferPhase::Transmit);
    /// assert_eq!(err.kind(), ErrorKind::Protocol);
    /// assert_eq!(err.phase(), Some(TransferPhase::Transmit));
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Access { .. } | Self::UnsupportedSource { .. } => ErrorKind::Access,
            Self::Format(_) => ErrorKind::Format,
            Self::PathTraversal { .. } | Self::SymlinkEscape { .. } => ErrorKind::PathTraversal,
            Self::Io(_) => ErrorKind::Io,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::Phase { source, .. } => source.kind(),
        }
    }

    /// Returns the flow phase this error was tagged with, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<TransferPhase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Returns the error with any phase tag removed.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns `true` if the archive tried to write outside the destination.
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        self.kind() == ErrorKind::PathTraversal
    }

    /// Returns `true` if the underlying failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Io(e) if e.kind() == std::io::ErrorKind::TimedOut)
    }

    /// Returns the HTTP status carried by a protocol failure.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Protocol { status, .. } => *status,
            _ => None,
        }
    }
}

/// Attaches a [`TransferPhase`] to the error of a `Result`.
pub trait PhaseExt<T> {
    /// Tags the error, if any, with `phase`.
    fn phase(self, phase: TransferPhase) -> Result<T>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn phase(self, phase: TransferPhase) -> Result<T> {
        self.map_err(|e| e.in_phase(phase))
    }
}
