//! Download flow: request, GET, unpack, then optionally open.

use crate::PhaseExt;
use crate::Result;
use crate::TransferPhase;
use crate::extraction::unpack;
use crate::open::Opener;
use crate::protocol::ControlApi;
use crate::protocol::ObjectStore;
use crate::report::DownloadReport;
use crate::report::OpenOutcome;
use std::path::Path;

/// Parameters of one download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Remote machine to download from.
    pub machine_id: &'a str,

    /// Remote file or folder to fetch.
    pub source_path: &'a str,

    /// Local folder the archive is unpacked into; created if absent.
    pub destination: &'a Path,

    /// For a folder source, fetch its children instead of the folder itself.
    pub contents_only: bool,

    /// Hand the reveal candidate to the system handler afterwards.
    pub open_after: bool,
}

/// Fetches `request.source_path` from the remote machine and unpacks it.
///
/// Nothing is written locally unless both the request and the GET succeed.
/// When `open_after` is set and something was extracted, the single
/// top-level item (or the destination when there are several) is opened;
/// a failure there is recorded in the report, never returned as an error.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::TransferConfig;
/// use ferry_core::open::SystemOpener;
/// use ferry_core::protocol::DownloadRequest;
/// use ferry_core::protocol::HttpControlApi;
/// use ferry_core::protocol::HttpObjectStore;
/// use ferry_core::protocol::download;
/// use std::path::Path;
///
/// let config = TransferConfig::from_env();
/// let control = HttpControlApi::new(&config)?;
/// let store = HttpObjectStore::new(&config)?;
///
/// let request = DownloadRequest {
///     machine_id: "machine-123",
///     source_path: "/Users/vagrant/build/MyApp.ipa",
///     destination: Path::new("./artifacts"),
///     contents_only: false,
///     open_after: true,
/// };
/// let report = download(&request, &control, &store, &SystemOpener)?;
/// println!("{}", report.summary());
/// # Ok::<(), ferry_core::TransferError>(())
/// ```
///
/// # Errors
///
/// Every error is tagged with the phase it happened in: `request`, `fetch`
/// or `extract`.
pub fn download(
    request: &DownloadRequest<'_>,
    control: &dyn ControlApi,
    store: &dyn ObjectStore,
    opener: &dyn Opener,
) -> Result<DownloadReport> {
    let start = std::time::Instant::now();

    let ticket = control
        .request_download(request.machine_id, request.source_path, request.contents_only)
        .phase(TransferPhase::Request)?;

    let bytes = store.get(&ticket.signed_url).phase(TransferPhase::Fetch)?;
    tracing::info!(
        machine_id = request.machine_id,
        source_path = request.source_path,
        bytes = bytes.len(),
        "archive fetched"
    );

    let extraction = unpack(&bytes, request.destination).phase(TransferPhase::Extract)?;
    let destination = extraction.root.clone();
    let reveal = extraction.reveal_candidate();

    let open = if request.open_after && !extraction.extracted.is_empty() {
        match opener.open(&reveal) {
            Ok(()) => OpenOutcome::Opened,
            Err(reason) => {
                tracing::warn!(path = %reveal.display(), %reason, "failed to open downloaded item");
                OpenOutcome::Failed(reason)
            }
        }
    } else {
        OpenOutcome::NotRequested
    };

    tracing::info!(
        destination = %destination.display(),
        items = extraction.total_items(),
        reveal = %reveal.display(),
        "download complete"
    );

    Ok(DownloadReport {
        machine_id: request.machine_id.to_string(),
        source_path: request.source_path.to_string(),
        destination,
        archive_bytes: bytes.len() as u64,
        extraction,
        reveal,
        open,
        duration: start.elapsed(),
    })
}
