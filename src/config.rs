//! Configuration for the hotseat servers.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values. A single
//! binary runs either tier; `--tier` selects which.

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// Which TCP tier this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// The quiz server players connect to.
    GameHost,
    /// The hint service the game host consults.
    LifelineService,
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "hotseat")]
#[command(version = "0.1.0")]
#[command(about = "A two-tier trivia game server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tier to run (game-host or lifeline-service)
    #[arg(short, long, value_enum)]
    pub tier: Option<Tier>,

    /// Address to bind the selected tier to (e.g., 127.0.0.1:4337)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Address of the lifeline service (game host only)
    #[arg(long)]
    pub lifeline_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    /// Tier to run when the CLI does not say.
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub lifeline: LifelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Game host settings.
#[derive(Debug, Deserialize)]
pub struct GameConfig {
    /// Address the game host binds to.
    #[serde(default = "default_game_listen")]
    pub listen: String,
    /// Address of the lifeline service.
    #[serde(default = "default_lifeline_listen")]
    pub lifeline_addr: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            listen: default_game_listen(),
            lifeline_addr: default_lifeline_listen(),
        }
    }
}

/// Lifeline service settings.
#[derive(Debug, Deserialize)]
pub struct LifelineConfig {
    /// Address the lifeline service binds to.
    #[serde(default = "default_lifeline_listen")]
    pub listen: String,
}

impl Default for LifelineConfig {
    fn default() -> Self {
        Self {
            listen: default_lifeline_listen(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_game_listen() -> String {
    "127.0.0.1:4337".to_string()
}

fn default_lifeline_listen() -> String {
    "127.0.0.1:4338".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub tier: Tier,
    pub listen: String,
    pub lifeline_addr: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(cli, toml_config))
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        let tier = cli.tier.or(toml_config.tier).unwrap_or(Tier::GameHost);

        let listen = cli.listen.unwrap_or(match tier {
            Tier::GameHost => toml_config.game.listen,
            Tier::LifelineService => toml_config.lifeline.listen,
        });

        Config {
            tier,
            listen,
            lifeline_addr: cli.lifeline_addr.unwrap_or(toml_config.game.lifeline_addr),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        }
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
