// CLI module for assist-governor
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// assist-governor - cache, rate-limit and fallback layer for outbound LLM calls
#[derive(Parser, Debug)]
#[command(name = "assist-governor", version, about, long_about = None)]
pub struct Args {
    /// Config file (default: ~/.assist-governor/config.toml)
    #[arg(short, long, env = "ASSIST_GOVERNOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}
