//! Upload flow: pack, start, PUT, complete.

use crate::PhaseExt;
use crate::Result;
use crate::TransferPhase;
use crate::config::TransferConfig;
use crate::creation::pack;
use crate::protocol::ControlApi;
use crate::protocol::ObjectStore;
use crate::protocol::UploadSession;
use crate::report::UploadReport;
use std::fmt;
use std::path::Path;

/// Parameters of one upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Remote machine to upload to.
    pub machine_id: &'a str,

    /// Local file or directory to pack.
    pub source: &'a Path,

    /// Remote folder the archive is unpacked into.
    pub destination_parent: &'a str,

    /// For a directory source, archive its children instead of the
    /// directory itself.
    pub contents_only: bool,
}

/// How far an upload session has progressed.
///
/// Stages only move forward: `Started → Transmitted → Completed`. Nothing
/// counts as uploaded before `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    /// The control API opened a session and returned a signed URL.
    Started,

    /// The archive body was accepted by the object store.
    Transmitted,

    /// The control API confirmed the upload.
    Completed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Transmitted => "transmitted",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// One in-flight upload session. Lives for a single [`upload`] call.
struct UploadSaga<'a> {
    machine_id: &'a str,
    session: UploadSession,
    stage: UploadStage,
}

impl<'a> UploadSaga<'a> {
    fn start(control: &dyn ControlApi, machine_id: &'a str) -> Result<Self> {
        let session = control.begin_upload(machine_id).phase(TransferPhase::Start)?;
        let saga = Self {
            machine_id,
            session,
            stage: UploadStage::Started,
        };
        saga.log_stage();
        Ok(saga)
    }

    fn transmit(&mut self, store: &dyn ObjectStore, bytes: &[u8]) -> Result<()> {
        debug_assert_eq!(self.stage, UploadStage::Started);
        store
            .put(&self.session.signed_url, bytes)
            .phase(TransferPhase::Transmit)?;
        self.advance(UploadStage::Transmitted);
        Ok(())
    }

    fn complete(mut self, control: &dyn ControlApi, destination_parent: &str) -> Result<String> {
        debug_assert_eq!(self.stage, UploadStage::Transmitted);
        control
            .complete_upload(self.machine_id, &self.session.upload_id, destination_parent)
            .phase(TransferPhase::Complete)?;
        self.advance(UploadStage::Completed);
        Ok(self.session.upload_id)
    }

    fn advance(&mut self, next: UploadStage) {
        self.stage = next;
        self.log_stage();
    }

    fn log_stage(&self) {
        tracing::info!(
            machine_id = self.machine_id,
            upload_id = %self.session.upload_id,
            stage = %self.stage,
            "upload stage"
        );
    }
}

/// Packs `request.source` and pushes it to the remote machine.
///
/// The archive is built first, so a source that cannot be read never opens
/// a remote session. A failed PUT aborts before the completion call.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::TransferConfig;
/// use ferry_core::protocol::HttpControlApi;
/// use ferry_core::protocol::HttpObjectStore;
/// use ferry_core::protocol::UploadRequest;
/// use ferry_core::protocol::upload;
/// use std::path::Path;
///
/// let config = TransferConfig::from_env();
/// let control = HttpControlApi::new(&config)?;
/// let store = HttpObjectStore::new(&config)?;
///
/// let request = UploadRequest {
///     machine_id: "machine-123",
///     source: Path::new("./MyApp"),
///     destination_parent: "/Users/vagrant/work",
///     contents_only: false,
/// };
/// let report = upload(&request, &control, &store, &config)?;
/// println!("{}", report.summary());
/// # Ok::<(), ferry_core::TransferError>(())
/// ```
///
/// # Errors
///
/// Every error is tagged with the phase it happened in: `pack`, `start`,
/// `transmit` or `complete`.
pub fn upload(
    request: &UploadRequest<'_>,
    control: &dyn ControlApi,
    store: &dyn ObjectStore,
    config: &TransferConfig,
) -> Result<UploadReport> {
    let start = std::time::Instant::now();

    let archive = pack(request.source, !request.contents_only, config).phase(TransferPhase::Pack)?;
    let (bytes, pack_report) = archive.into_parts();
    tracing::info!(
        source = %request.source.display(),
        entries = pack_report.total_entries(),
        bytes = bytes.len(),
        "archive ready for upload"
    );

    let mut saga = UploadSaga::start(control, request.machine_id)?;
    saga.transmit(store, &bytes)?;
    let upload_id = saga.complete(control, request.destination_parent)?;

    Ok(UploadReport {
        machine_id: request.machine_id.to_string(),
        source: request.source.to_path_buf(),
        destination_parent: request.destination_parent.to_string(),
        upload_id,
        pack: pack_report,
        duration: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(UploadStage::Started < UploadStage::Transmitted);
        assert!(UploadStage::Transmitted < UploadStage::Completed);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(UploadStage::Started.to_string(), "started");
        assert_eq!(UploadStage::Completed.to_string(), "completed");
    }
}
