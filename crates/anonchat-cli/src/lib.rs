//! Anonchat CLI library
//!
//! Console front end for the anonchat engine: argument parsing, layered
//! configuration, the line-based console transport and a keyword classifier.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;

pub use classifier::KeywordClassifier;
pub use cli::{Cli, Commands};
pub use config::{CliAppConfig, CliConfig};
pub use console::{ConsoleOptions, ConsoleTransport};
pub use error::{CliError, Result};
