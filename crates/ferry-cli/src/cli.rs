//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use ferry_core::config::ENV_API_BASE_URL;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a file or directory into a tar.gz archive
    Pack(PackArgs),
    /// Unpack a local tar.gz archive
    Unpack(UnpackArgs),
    /// Upload a file or directory to a remote machine
    Upload(UploadArgs),
    /// Download a file or folder from a remote machine
    Download(DownloadArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct PackArgs {
    /// File or directory to pack
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Output archive file path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Archive the children of a directory instead of the directory itself
    #[arg(long)]
    pub contents_only: bool,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,

    /// Overwrite output file if exists
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct UnpackArgs {
    /// Path to the tar.gz archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Destination directory (created if missing)
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,

    /// Open the unpacked item, or the destination, afterwards
    #[arg(long)]
    pub open: bool,
}

/// Options shared by commands that talk to the remote API.
#[derive(clap::Args)]
pub struct RemoteArgs {
    /// Control API base URL
    #[arg(long, value_name = "URL", env = ENV_API_BASE_URL)]
    pub api_url: Option<String>,

    /// Timeout in seconds for the archive PUT or GET
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub transfer_timeout: Option<u64>,
}

#[derive(clap::Args)]
pub struct UploadArgs {
    /// Remote machine id
    #[arg(value_name = "MACHINE")]
    pub machine_id: String,

    /// Local file or directory to upload
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Remote folder the upload is unpacked into
    #[arg(value_name = "DEST_PARENT")]
    pub destination_parent: String,

    /// Upload the children of a directory instead of the directory itself
    #[arg(long)]
    pub contents_only: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(clap::Args)]
pub struct DownloadArgs {
    /// Remote machine id
    #[arg(value_name = "MACHINE")]
    pub machine_id: String,

    /// Remote file or folder to download
    #[arg(value_name = "SOURCE")]
    pub source_path: String,

    /// Local folder to unpack into (created if missing)
    #[arg(value_name = "DEST_PARENT")]
    pub destination: PathBuf,

    /// Download the children of a folder instead of the folder itself
    #[arg(long)]
    pub contents_only: bool,

    /// Open the downloaded item, or the destination, afterwards
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download_flags() {
        let cli = Cli::try_parse_from([
            "ferry",
            "download",
            "m-1",
            "/Users/vagrant/out",
            "./dest",
            "--contents-only",
            "--open",
            "--transfer-timeout",
            "30",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.machine_id, "m-1");
        assert!(args.contents_only);
        assert!(args.open);
        assert_eq!(args.remote.transfer_timeout, Some(30));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["ferry", "-q", "-v", "pack", "a", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_compression_level_range() {
        let result = Cli::try_parse_from(["ferry", "pack", "a", "b", "-l", "0"]);
        assert!(result.is_err());
    }
}
