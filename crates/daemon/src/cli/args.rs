pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Two-node end-to-end encrypted chat")]
pub struct Args {
    /// URL of the local node's API (defaults to the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the parley config directory (defaults to ~/.parley)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
