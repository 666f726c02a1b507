use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Seedream image generation relay
#[derive(Debug, Parser)]
#[command(name = "seedream", about = "Relay for image generation requests that keeps the API key server-side")]
pub struct Args {
    /// Path to configuration file; plain environment variables are used when it does not exist
    #[arg(short, long, default_value = "seedream.toml", env = "SEEDREAM_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "SEEDREAM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}
