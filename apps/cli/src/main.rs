//! Leadloom CLI — batch outreach pipeline.
//!
//! Reads company URLs from a spreadsheet, summarizes each site with an LLM,
//! enriches contacts, and drafts personalized outreach emails.

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
