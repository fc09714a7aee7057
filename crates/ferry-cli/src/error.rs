//! Error conversion utilities for CLI.
//!
//! Converts ferry-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use ferry_core::TransferError;
use ferry_core::config::ENV_API_TOKEN;

/// Converts `TransferError` to user-friendly anyhow error with context.
///
/// `subject` names what the command was working on: a local path, an archive
/// or a remote path.
pub fn convert_transfer_error(err: TransferError, subject: &str) -> anyhow::Error {
    let phase = err
        .phase()
        .map_or_else(String::new, |phase| format!(" during {phase}"));

    match err.root() {
        TransferError::PathTraversal { .. } | TransferError::SymlinkEscape { .. } => anyhow!(
            "Security violation{phase}: archive for '{subject}' tried to write outside the destination: {err}\n\
             HINT: The archive may be malicious. Entries after the offending one were not written."
        ),
        TransferError::UnsupportedSource { .. } => anyhow!(
            "Cannot pack '{subject}': {err}\n\
             HINT: Only regular files, directories and symbolic links can be transferred."
        ),
        TransferError::Access { .. } => anyhow!(
            "Cannot access '{subject}'{phase}: {err}\n\
             HINT: Check that the path exists and is readable, and that the destination is writable."
        ),
        TransferError::Format(_) => anyhow!(
            "Invalid archive '{subject}'{phase}: {err}\n\
             HINT: The archive may be corrupted or truncated."
        ),
        TransferError::Protocol {
            status: Some(401 | 403),
            ..
        } => anyhow!(
            "Request rejected for '{subject}'{phase}: {err}\n\
             HINT: Check that {ENV_API_TOKEN} holds a valid token with access to this machine."
        ),
        TransferError::Protocol {
            status: Some(404), ..
        } => anyhow!(
            "Not found: '{subject}'{phase}: {err}\n\
             HINT: Check the machine id and the remote path."
        ),
        TransferError::Protocol { .. } => anyhow!(
            "Remote error for '{subject}'{phase}: {err}\n\
             HINT: The remote service rejected the request; retry later."
        ),
        TransferError::InvalidConfig { .. } => anyhow!(
            "{err}\n\
             HINT: Set {ENV_API_TOKEN}, and --api-url for a non-default endpoint."
        ),
        TransferError::Io(_) if err.is_timeout() => anyhow!(
            "Timed out{phase} while transferring '{subject}': {err}\n\
             HINT: Retry, or raise the limit with --transfer-timeout."
        ),
        _ => anyhow::Error::from(err).context(format!("Error processing '{subject}'")),
    }
}

/// Adds user-facing context to a ferry-core result.
pub fn add_transfer_context<T>(
    result: Result<T, TransferError>,
    subject: &str,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_transfer_error(e, subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::TransferPhase;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_path_traversal_error() {
        let err = TransferError::PathTraversal {
            path: PathBuf::from("../../../etc/passwd"),
        }
        .in_phase(TransferPhase::Extract);
        let converted = convert_transfer_error(err, "/Users/vagrant/out");
        let msg = format!("{converted}");
        assert!(msg.contains("Security violation during extract"));
        assert!(msg.contains("path traversal"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_unauthorized_mentions_token() {
        let err = TransferError::Protocol {
            status: Some(401),
            message: "unauthorized".into(),
        }
        .in_phase(TransferPhase::Start);
        let msg = format!("{}", convert_transfer_error(err, "./proj"));
        assert!(msg.contains("FERRY_TOKEN"));
        assert!(msg.contains("during start"));
    }

    #[test]
    fn test_convert_timeout() {
        let err = TransferError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow"))
            .in_phase(TransferPhase::Fetch);
        let msg = format!("{}", convert_transfer_error(err, "/remote"));
        assert!(msg.contains("Timed out during fetch"));
        assert!(msg.contains("--transfer-timeout"));
    }

    #[test]
    fn test_convert_plain_io_error_keeps_source() {
        let err = TransferError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let converted = convert_transfer_error(err, "archive.tar.gz");
        let msg = format!("{converted:#}");
        assert!(msg.contains("archive.tar.gz"));
        assert!(msg.contains("gone"));
    }
}
