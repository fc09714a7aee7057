//! Subcommand implementations.

pub mod completion;
pub mod download;
pub mod pack;
pub mod unpack;
pub mod upload;

use crate::cli::RemoteArgs;
use crate::error::add_transfer_context;
use anyhow::Result;
use ferry_core::TransferConfig;
use std::time::Duration;

/// Environment configuration with command-line overrides applied.
pub fn remote_config(args: &RemoteArgs) -> Result<TransferConfig> {
    let mut config = TransferConfig::from_env();
    if let Some(url) = &args.api_url {
        config = config.with_api_base_url(url.as_str());
    }
    if let Some(secs) = args.transfer_timeout {
        config = config.with_transfer_timeout(Duration::from_secs(secs));
    }
    add_transfer_context(config.validate(), "configuration")?;
    Ok(config)
}
