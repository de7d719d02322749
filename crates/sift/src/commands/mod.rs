//! Command implementations for the sift CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod filter;

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Criteria compilation error.
    #[error("filter error: {0}")]
    Filter(#[from] sift_expr_rs::FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input records could not be used.
    #[error("input error: {0}")]
    Input(String),

    /// Invalid combination of arguments.
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments and the loaded config.
    pub fn new(cli: &Cli, config: &Config) -> Self {
        Self {
            json_output: cli.json,
            pretty: config.output.pretty.unwrap_or(true),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }

    /// Serializes a value as JSON, honoring the `pretty` setting.
    pub fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}
