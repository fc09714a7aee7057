//! Unpack command implementation.

use crate::cli::UnpackArgs;
use crate::error::add_transfer_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use ferry_core::OpenOutcome;
use ferry_core::open::Opener;
use ferry_core::open::SystemOpener;
use ferry_core::unpack;
use std::fs;

pub fn execute(args: &UnpackArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let bytes = fs::read(&args.archive)
        .with_context(|| format!("failed to read archive {}", args.archive.display()))?;

    let archive = args.archive.display().to_string();
    let report = add_transfer_context(unpack(&bytes, &args.destination), &archive)?;

    let note = if args.open && !report.extracted.is_empty() {
        let reveal = report.reveal_candidate();
        let outcome = SystemOpener
            .open(&reveal)
            .map_or_else(OpenOutcome::Failed, |()| OpenOutcome::Opened);
        outcome.note(reveal == report.root)
    } else {
        None
    };

    formatter.format_unpack_result(&report, note.as_deref())
}
