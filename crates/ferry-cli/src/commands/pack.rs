//! Pack command implementation.

use crate::cli::PackArgs;
use crate::error::add_transfer_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use ferry_core::TransferConfig;
use ferry_core::pack;
use std::fs;

pub fn execute(args: &PackArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "Output file already exists: {}\nHINT: Use --force to overwrite.",
            args.output.display()
        );
    }

    let mut config = TransferConfig::from_env();
    if let Some(level) = args.compression_level {
        config = config.with_compression_level(level);
    }

    let source = args.source.display().to_string();
    let archive = add_transfer_context(pack(&args.source, !args.contents_only, &config), &source)?;

    fs::write(&args.output, archive.as_bytes())
        .with_context(|| format!("failed to write archive to {}", args.output.display()))?;

    formatter.format_pack_result(&args.output, archive.report())
}
