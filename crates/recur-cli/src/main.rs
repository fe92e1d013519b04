//! Recur CLI - find recurring subscriptions in exported spending data
//!
//! Usage:
//!   recur scan --file transactions.csv    Detect recurring charges
//!   recur emails --file mailbox.json      Scan exported email receipts
//!   recur registry                        Show the resolved lookup tables

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Scan {
            file,
            json,
            min_confidence,
        } => commands::cmd_scan(&file, cli.registry.as_deref(), json, min_confidence),
        Commands::Emails { file, json } => {
            commands::cmd_emails(&file, cli.registry.as_deref(), json)
        }
        Commands::Registry => commands::cmd_registry(cli.registry.as_deref()),
    }
}
