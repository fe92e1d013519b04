//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recur - find recurring subscriptions in your spending
#[derive(Parser)]
#[command(name = "recur")]
#[command(about = "Find recurring subscriptions in exported bank and mailbox data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Registry TOML overriding the built-in lookup tables
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect recurring charges in a transactions CSV
    Scan {
        /// CSV file with Date, Description, Amount columns
        /// (Merchant and Currency are optional)
        #[arg(short, long)]
        file: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Minimum confidence to report (0.0 - 1.0)
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Scan an exported mailbox for subscription receipts
    Emails {
        /// JSON file holding an array of messages
        #[arg(short, long)]
        file: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved lookup tables
    Registry,
}
