//! Upload command implementation.

use crate::cli::UploadArgs;
use crate::commands::remote_config;
use crate::error::add_transfer_context;
use crate::output::OutputFormatter;
use crate::progress::Spinner;
use anyhow::Result;
use ferry_core::protocol::HttpControlApi;
use ferry_core::protocol::HttpObjectStore;
use ferry_core::protocol::UploadRequest;
use ferry_core::protocol::upload;

pub fn execute(args: &UploadArgs, formatter: &dyn OutputFormatter, show_progress: bool) -> Result<()> {
    let config = remote_config(&args.remote)?;
    let subject = args.source.display().to_string();

    let control = add_transfer_context(HttpControlApi::new(&config), &subject)?;
    let store = add_transfer_context(HttpObjectStore::new(&config), &subject)?;

    let request = UploadRequest {
        machine_id: &args.machine_id,
        source: &args.source,
        destination_parent: &args.destination_parent,
        contents_only: args.contents_only,
    };

    let spinner = Spinner::start(&format!("Uploading {subject}"), show_progress);
    let result = upload(&request, &control, &store, &config);
    drop(spinner);

    let report = add_transfer_context(result, &subject)?;
    formatter.format_upload_result(&report)
}
