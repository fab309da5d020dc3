//! relnotes CLI: render the release note for the tag being built.
//!
//! Reads the release identifiers from the CI environment and writes the
//! rendered note to stdout; logs go to stderr.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;
use relnotes_shared::RunMode;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let mode = RunMode::detect(|name| std::env::var(name).ok());
    commands::init_tracing(&cli, mode);
    commands::run(cli, mode).await
}
