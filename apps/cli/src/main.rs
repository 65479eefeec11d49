//! VariantScope CLI: inspect personalization variants in content documents.
//!
//! Detects `PersonalizationContainer` blocks on the content API and plans
//! one translation job per variant.

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
