//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the sift CLI.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

/// sift - Filter JSON records with key:value criteria
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter records read from a file or stdin
    #[command(alias = "f")]
    Filter {
        /// Criteria string (e.g., "kind:bolt;qty:1..10;name:~jdo")
        expression: Option<String>,

        /// Read records from a file instead of stdin (JSON array or JSON Lines)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Exact, case-sensitive match on a field (repeatable)
        #[arg(long, value_name = "FIELD=VALUE", action = clap::ArgAction::Append)]
        exact: Vec<FieldValue>,

        /// Fuzzy subsequence match on a field (repeatable)
        #[arg(long, value_name = "FIELD=VALUE", action = clap::ArgAction::Append)]
        fuzzy: Vec<FieldValue>,

        /// Substring search over comma-separated fields (repeatable)
        #[arg(long, value_name = "FIELDS=VALUE", action = clap::ArgAction::Append)]
        search: Vec<FieldValue>,

        /// Inclusive numeric range on a field (repeatable)
        #[arg(long, value_name = "FIELD=LOW..HIGH", action = clap::ArgAction::Append)]
        range: Vec<RangeBounds>,

        /// Fail on malformed segments and invalid bounds or dates
        #[arg(long)]
        strict: bool,

        /// Print only the number of matching records
        #[arg(short, long)]
        count: bool,

        /// Stop after this many matches
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Compile a criteria string and show its clauses and diagnostics
    #[command(alias = "c")]
    Check {
        /// Criteria string
        expression: String,

        /// Exit with an error if any error diagnostic is reported
        #[arg(long)]
        strict: bool,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// A `FIELD=VALUE` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub field: String,
    pub value: String,
}

impl FromStr for FieldValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
        if field.is_empty() {
            return Err(format!("missing field name in '{s}'"));
        }
        Ok(Self {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

impl FieldValue {
    /// Returns the comma-separated field names.
    pub fn fields(&self) -> Vec<&str> {
        self.field.split(',').filter(|f| !f.is_empty()).collect()
    }
}

/// A `FIELD=LOW..HIGH` argument.
///
/// Bounds stay text here; whether they are usable numbers is decided when
/// the range control is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBounds {
    pub field: String,
    pub low: String,
    pub high: String,
}

impl FromStr for RangeBounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let FieldValue { field, value } = s.parse()?;
        let (low, high) = value
            .split_once("..")
            .ok_or_else(|| format!("expected FIELD=LOW..HIGH, got '{s}'"))?;
        Ok(Self {
            field,
            low: low.to_string(),
            high: high.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This verifies that the CLI is correctly defined
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["sift", "--verbose", "check", "a:1"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(!cli.json);

        let cli = Cli::parse_from(["sift", "--quiet", "--json", "check", "a:1"]);
        assert!(!cli.verbose);
        assert!(cli.quiet);
        assert!(cli.json);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["sift", "-v", "-q", "check", "a:1"]).is_err());
    }

    #[test]
    fn test_filter_alias() {
        let cli = Cli::parse_from(["sift", "f", "a:1"]);
        assert!(matches!(cli.command, Commands::Filter { .. }));
    }

    #[test]
    fn test_filter_with_options() {
        let cli = Cli::parse_from([
            "sift",
            "filter",
            "kind:bolt",
            "-i",
            "stock.json",
            "--exact",
            "sku=A-1",
            "--fuzzy",
            "name=jdo",
            "--search",
            "name,team=core",
            "--range",
            "qty=1..10",
            "--range",
            "age=18..",
            "--strict",
            "--count",
        ]);
        if let Commands::Filter {
            expression,
            input,
            exact,
            fuzzy,
            search,
            range,
            strict,
            count,
            limit,
        } = cli.command
        {
            assert_eq!(expression.as_deref(), Some("kind:bolt"));
            assert_eq!(input, Some(PathBuf::from("stock.json")));
            assert_eq!(exact[0].field, "sku");
            assert_eq!(exact[0].value, "A-1");
            assert_eq!(fuzzy[0].value, "jdo");
            assert_eq!(search[0].fields(), vec!["name", "team"]);
            assert_eq!(range.len(), 2);
            assert_eq!(range[1].high, "");
            assert!(strict);
            assert!(count);
            assert!(limit.is_none());
        } else {
            panic!("Expected Filter command");
        }
    }

    #[test]
    fn test_filter_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["sift", "filter", "--exact", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["sift", "filter", "--exact", "=x"]).is_err());
        assert!(Cli::try_parse_from(["sift", "filter", "--range", "qty=5"]).is_err());
    }

    #[test]
    fn test_field_value_keeps_later_equals() {
        let parsed: FieldValue = "expr=a=b".parse().unwrap();
        assert_eq!(parsed.field, "expr");
        assert_eq!(parsed.value, "a=b");
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::parse_from(["sift", "check", "d:1..x", "--strict"]);
        if let Commands::Check { expression, strict } = cli.command {
            assert_eq!(expression, "d:1..x");
            assert!(strict);
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["sift", "config", "set", "cache.capacity", "64"]);
        if let Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        } = cli.command
        {
            assert_eq!(key, "cache.capacity");
            assert_eq!(value, "64");
        } else {
            panic!("Expected Config Set command");
        }

        let cli = Cli::parse_from(["sift", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: Some(ConfigCommands::Init { force: true })
            }
        ));
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["sift", "completions", "zsh"]);
        if let Commands::Completions { shell } = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}
