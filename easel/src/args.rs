use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Easel image generation router
#[derive(Debug, Parser)]
#[command(name = "easel", about = "Routes image generation requests across DALL-E and Midjourney")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "easel.toml", env = "EASEL_CONFIG")]
    pub config: PathBuf,

    /// Override the configured listen address
    #[arg(long, env = "EASEL_LISTEN")]
    pub listen: Option<SocketAddr>,
}
