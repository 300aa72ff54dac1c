pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sealpost")]
#[command(about = "Send files to peers, encrypted for their public key")]
pub struct Args {
    /// URL of the local node (defaults to the listen port in config.toml)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the sealpost config directory (defaults to ~/.sealpost)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
