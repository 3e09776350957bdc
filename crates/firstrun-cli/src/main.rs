mod completion;
mod dispatch;
mod render;
mod tail;


use anyhow::Result;
use clap::Parser;

use crate::dispatch::{run_cli, Cli};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    run_cli(Cli::parse())
}
