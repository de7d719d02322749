use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use sift_expr_rs::ExpressionCompiler;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{load_config, Config, ConfigSetOptions};
use commands::filter::FilterOptions;
use commands::{CommandContext, CommandError};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "SIFT_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config();

    init_tracing(&cli, config.as_ref().ok());

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the stderr subscriber.
///
/// `-v` and `-q` win, then `SIFT_LOG`, then the config's `log.level`.
fn init_tracing(cli: &Cli, config: Option<&Config>) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            let level = config.map_or(commands::config::DEFAULT_LOG_LEVEL, |c| c.log_level());
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli, config: commands::Result<Config>) -> commands::Result<()> {
    // Config and completions work even when the config file is broken.
    match &cli.command {
        Commands::Config { command } => {
            let ctx = CommandContext::new(cli, &Config::default());
            return match command {
                None | Some(ConfigCommands::Show) => commands::config::execute_show(&ctx),
                Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
                Some(ConfigCommands::Init { force }) => {
                    commands::config::execute_init(&ctx, *force)
                }
                Some(ConfigCommands::Set { key, value }) => commands::config::execute_set(
                    &ctx,
                    &ConfigSetOptions {
                        key: key.clone(),
                        value: value.clone(),
                    },
                ),
            };
        }
        Commands::Completions { shell } => {
            commands::completions::execute(shell)?;
            return Ok(());
        }
        _ => {}
    }

    let config = config?;
    let ctx = CommandContext::new(cli, &config);
    let compiler = Arc::new(ExpressionCompiler::with_capacity(config.cache_capacity()));

    match &cli.command {
        Commands::Filter {
            expression,
            input,
            exact,
            fuzzy,
            search,
            range,
            strict,
            count,
            limit,
        } => {
            let opts = FilterOptions {
                expression: expression.clone(),
                input: input.clone(),
                exact: exact.clone(),
                fuzzy: fuzzy.clone(),
                search: search.clone(),
                range: range.clone(),
                strict: *strict,
                count: *count,
                limit: *limit,
            };
            commands::filter::execute(&ctx, &opts, &compiler)
        }
        Commands::Check { expression, strict } => {
            commands::check::execute(&ctx, expression, *strict, &compiler)
        }
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Input(_) => "INPUT_ERROR",
        CommandError::Usage(_) => "USAGE_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Filter(_) | CommandError::Usage(_) => ExitCode::from(2),
        CommandError::Config(_) => ExitCode::from(3),
        CommandError::Input(_) | CommandError::Io(_) | CommandError::Json(_) => ExitCode::from(1),
    }
}
