//! coursekit CLI: lesson publishing to SharePoint and S3 exposure remediation.
//!
//! `publish` renders changed Markdown lessons into site pages and rebuilds the
//! quick-launch menu; `remediate` handles a Security Hub finding event.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
