//! Configuration loading and resolution
//!
//! A run is configured from a single TOML file. The file is located with the
//! following priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CINESYNC_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/cinesync/config.toml`)
//!
//! The TMDB API key may additionally be supplied through
//! `CINESYNC_TMDB_API_KEY`, which overrides the file.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CINESYNC_CONFIG";

/// Environment variable carrying the TMDB API key
pub const API_KEY_ENV_VAR: &str = "CINESYNC_TMDB_API_KEY";

/// Requests issued per scheduler tick unless configured otherwise
pub const DEFAULT_REQUESTS_PER_TICK: usize = 39;

/// Pause between two scheduler ticks unless configured otherwise
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10_000;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3/";
pub const DEFAULT_TMDB_LANGUAGE: &str = "en-US";

/// Raw configuration file as deserialized from TOML
///
/// Required settings are `Option` so that a missing key is reported by name
/// instead of as a generic parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub database_url: Option<String>,

    #[serde(default)]
    pub tmdb: TomlTmdbSection,

    #[serde(default)]
    pub collections: TomlCollections,

    #[serde(default)]
    pub scheduler: TomlScheduler,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlTmdbSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlCollections {
    pub main_movies: Option<String>,
    pub main_people: Option<String>,
    pub staged_movies: Option<String>,
    pub staged_people: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlScheduler {
    pub requests_per_tick: Option<usize>,
    pub tick_interval_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Remote catalog settings
#[derive(Clone)]
pub struct TmdbSettings {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
}

impl fmt::Debug for TmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish()
    }
}

/// Names of the two canonical and two staged collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub main_movies: String,
    pub main_people: String,
    pub staged_movies: String,
    pub staged_people: String,
}

/// Tick size and cooldown for the batch scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub requests_per_tick: usize,
    pub tick_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            requests_per_tick: DEFAULT_REQUESTS_PER_TICK,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub tmdb: TmdbSettings,
    pub collections: CollectionNames,
    pub scheduler: SchedulerSettings,
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Resolve, read and validate the configuration for this run
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_arg)?;
        info!("Loading configuration from {}", path.display());
        let raw = TomlConfig::load(&path)?;
        Self::from_toml(raw, std::env::var(API_KEY_ENV_VAR).ok())
    }

    /// Validate a parsed file, applying the environment API key override
    pub fn from_toml(raw: TomlConfig, env_api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(env_api_key, raw.tmdb.api_key)?;
        let database_url = required(raw.database_url, "database_url")?;

        let collections = CollectionNames {
            main_movies: required(raw.collections.main_movies, "collections.main_movies")?,
            main_people: required(raw.collections.main_people, "collections.main_people")?,
            staged_movies: required(raw.collections.staged_movies, "collections.staged_movies")?,
            staged_people: required(raw.collections.staged_people, "collections.staged_people")?,
        };
        ensure_distinct(&collections)?;

        let requests_per_tick = raw
            .scheduler
            .requests_per_tick
            .unwrap_or(DEFAULT_REQUESTS_PER_TICK);
        if requests_per_tick == 0 {
            return Err(Error::Config(
                "scheduler.requests_per_tick must be greater than zero".to_string(),
            ));
        }
        let tick_interval = Duration::from_millis(
            raw.scheduler
                .tick_interval_ms
                .unwrap_or(DEFAULT_TICK_INTERVAL_MS),
        );

        Ok(Self {
            database_url,
            tmdb: TmdbSettings {
                api_key,
                base_url: raw
                    .tmdb
                    .base_url
                    .filter(|u| is_valid_value(u))
                    .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
                language: raw
                    .tmdb
                    .language
                    .filter(|l| is_valid_value(l))
                    .unwrap_or_else(|| DEFAULT_TMDB_LANGUAGE.to_string()),
            },
            collections,
            scheduler: SchedulerSettings {
                requests_per_tick,
                tick_interval,
            },
            logging: raw.logging,
        })
    }
}

/// Locate the config file: CLI argument → environment → platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if is_valid_value(&path) {
            return Ok(PathBuf::from(path));
        }
    }

    let default = default_config_path()?;
    if default.exists() {
        Ok(default)
    } else {
        Err(Error::Config(format!(
            "No config file found. Pass --config, set {}, or create {}",
            CONFIG_ENV_VAR,
            default.display()
        )))
    }
}

/// Platform config file location (`~/.config/cinesync/config.toml` on Linux)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("cinesync").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Pick the API key: environment first, then the config file
fn resolve_api_key(env_key: Option<String>, toml_key: Option<String>) -> Result<String> {
    let env_key = env_key.filter(|k| is_valid_value(k));
    let toml_key = toml_key.filter(|k| is_valid_value(k));

    match (env_key, toml_key) {
        (Some(env), Some(_)) => {
            warn!(
                "TMDB API key found in both {} and config file. Using environment.",
                API_KEY_ENV_VAR
            );
            Ok(env)
        }
        (Some(env), None) => {
            info!("TMDB API key loaded from environment variable");
            Ok(env)
        }
        (None, Some(file)) => {
            info!("TMDB API key loaded from config file");
            Ok(file)
        }
        (None, None) => Err(Error::MissingSetting("tmdb.api_key")),
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| is_valid_value(v))
        .map(|v| v.trim().to_string())
        .ok_or(Error::MissingSetting(name))
}

fn ensure_distinct(names: &CollectionNames) -> Result<()> {
    let all = [
        &names.main_movies,
        &names.main_people,
        &names.staged_movies,
        &names.staged_people,
    ];
    for (i, a) in all.iter().enumerate() {
        if all[i + 1..].contains(a) {
            return Err(Error::Config(format!(
                "Collection name '{}' is used more than once",
                a
            )));
        }
    }
    Ok(())
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
