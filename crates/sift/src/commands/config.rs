//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/sift/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "SIFT_CONFIG";

/// Compiled expressions kept by the compiler when the config says nothing.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Log level used when neither flags, `SIFT_LOG` nor the config set one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# sift configuration

# Config schema version (do not modify)
version = 1

# Compiled criteria cache
[cache]
# capacity = 256            # Number of compiled strings to keep; 0 disables caching

# Logging (SIFT_LOG overrides this)
[log]
# level = "warn"            # "trace", "debug", "info", "warn", "error", "off"

# Output preferences
[output]
# pretty = true             # Pretty-print JSON output
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Compiler cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            cache: CacheConfig::default(),
            log: LogConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Returns the compiler cache capacity, falling back to the default.
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    /// Returns the configured log level, falling back to the default.
    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Compiler cache configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of compiled criteria strings to keep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level or filter directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/sift/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        if !xdg_config.is_empty() {
            return Ok(PathBuf::from(xdg_config).join("sift"));
        }
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("sift"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        tracing::warn!(
            version = config.version,
            supported = CONFIG_VERSION,
            "config file is newer than this build; unknown settings are ignored"
        );
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<PathBuf> {
    let path = get_config_path()?;

    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(path)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
            "effective": {
                "cache.capacity": config.cache_capacity(),
                "log.level": config.log_level(),
                "output.pretty": config.output.pretty.unwrap_or(true),
            },
        });
        println!("{}", ctx.to_json(&output)?);
    } else if !ctx.quiet {
        println!("Configuration\n");
        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        println!("[cache]");
        println!("  capacity: {}", config.cache_capacity());
        println!("\n[log]");
        println!("  level: {}", config.log_level());
        println!("\n[output]");
        println!("  pretty: {}", config.output.pretty.unwrap_or(true));

        if !path.exists() {
            println!("\n(No config file exists. Run 'sift config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;
    tracing::info!(path = %path.display(), "wrote default config");

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", ctx.to_json(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `section.field = value` assignment to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some(("cache", "capacity")) => {
            let capacity = value.parse::<usize>().map_err(|_| {
                CommandError::Config(format!(
                    "Invalid cache.capacity value '{}'. Use a non-negative integer",
                    value
                ))
            })?;
            config.cache.capacity = Some(capacity);
        }
        Some(("log", "level")) => {
            let level = value.to_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(CommandError::Config(format!(
                    "Invalid log.level value '{}'. Valid values: {}",
                    value,
                    LOG_LEVELS.join(", ")
                )));
            }
            config.log.level = Some(level);
        }
        Some(("output", "pretty")) => {
            config.output.pretty = Some(parse_bool(value)?);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: cache.capacity, log.level, output.pretty",
                key
            )));
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_setting(&mut config, &opts.key, &opts.value)?;
    let path = save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", ctx.to_json(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", ctx.to_json(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}
