mod aggregate;
mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod transfer;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    init_tracing();
    cli::Cli::parse().run()
}

/// Log filter from `RUST_LOG`, falling back to `fundtrack=info`. Logs go to
/// stderr so CLI output on stdout stays clean.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fundtrack=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
