//! Download command implementation.

use crate::cli::DownloadArgs;
use crate::commands::remote_config;
use crate::error::add_transfer_context;
use crate::output::OutputFormatter;
use crate::progress::Spinner;
use anyhow::Result;
use ferry_core::open::SystemOpener;
use ferry_core::protocol::DownloadRequest;
use ferry_core::protocol::HttpControlApi;
use ferry_core::protocol::HttpObjectStore;
use ferry_core::protocol::download;

pub fn execute(
    args: &DownloadArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let config = remote_config(&args.remote)?;
    let subject = args.source_path.as_str();

    let control = add_transfer_context(HttpControlApi::new(&config), subject)?;
    let store = add_transfer_context(HttpObjectStore::new(&config), subject)?;

    let request = DownloadRequest {
        machine_id: &args.machine_id,
        source_path: &args.source_path,
        destination: &args.destination,
        contents_only: args.contents_only,
        open_after: args.open,
    };

    let spinner = Spinner::start(&format!("Downloading {subject}"), show_progress);
    let result = download(&request, &control, &store, &SystemOpener);
    drop(spinner);

    let report = add_transfer_context(result, subject)?;
    formatter.format_download_result(&report)
}
