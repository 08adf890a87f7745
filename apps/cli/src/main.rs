//! DealScout CLI: find decision-makers at a target company.
//!
//! Searches public profiles for marketing and leadership contacts and prints
//! them as ranked plain-text blocks or JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
