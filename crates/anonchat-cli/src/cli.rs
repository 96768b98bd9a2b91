//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the matchmaker with participants typed on stdin
    Run {
        /// Print operator events as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print an example configuration file
    ExampleConfig,
    /// Load, validate and print the effective configuration
    CheckConfig,
}
