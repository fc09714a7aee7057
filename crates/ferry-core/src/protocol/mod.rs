//! Remote transfer protocol.
//!
//! An upload is `start → PUT → complete`; a download is
//! `request → GET → unpack`. The control API and the object store sit behind
//! the [`ControlApi`] and [`ObjectStore`] traits, with blocking `reqwest`
//! implementations for production use and in-memory fakes for tests.

pub mod control;
pub mod download;
pub mod object_store;
pub mod upload;

pub use control::ControlApi;
pub use control::DownloadTicket;
pub use control::HttpControlApi;
pub use control::UploadSession;
pub use download::DownloadRequest;
pub use download::download;
pub use object_store::HttpObjectStore;
pub use object_store::ObjectStore;
pub use upload::UploadRequest;
pub use upload::UploadStage;
pub use upload::upload;

use crate::TransferError;

/// Maps a transport failure: timeouts become `io::ErrorKind::TimedOut`,
/// everything else an I/O error carrying reqwest's message.
pub(crate) fn transport_error(err: &reqwest::Error) -> TransferError {
    let kind = if err.is_timeout() {
        std::io::ErrorKind::TimedOut
    } else if err.is_connect() {
        std::io::ErrorKind::ConnectionRefused
    } else {
        std::io::ErrorKind::Other
    };
    TransferError::Io(std::io::Error::new(kind, err.to_string()))
}

/// Turns a non-2xx response into a protocol error carrying status and body.
pub(crate) fn ensure_success(
    response: reqwest::blocking::Response,
) -> crate::Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(TransferError::Protocol {
        status: Some(status.as_u16()),
        message,
    })
}
