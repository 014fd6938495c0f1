// Configuration loading and parsing (config/raffle.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::raffle::Labels;

/// Contents written to `config/raffle.toml` when it does not exist yet.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/raffle.toml");

/// Database file name inside the platform data directory.
const DB_FILE_NAME: &str = "raffle.db";

const MIN_POLL_MS: u64 = 100;
const MAX_POLL_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// raffle.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub event: EventConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub title: String,
    pub fallback_tier: String,
    pub exhausted_label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Empty means "use the platform data directory".
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub hub_port: u16,
    pub poll_interval_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Tier selector labels for the raffle context.
    pub fn labels(&self) -> Labels {
        Labels {
            fallback_tier: self.event.fallback_tier.clone(),
            exhausted: self.event.exhausted_label.clone(),
        }
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sync.poll_interval_ms)
    }

    /// Where the shared snapshot database lives. A relative configured path
    /// is resolved against `base_dir`.
    pub fn db_path(&self, base_dir: &Path) -> Result<PathBuf, ConfigError> {
        let configured = self.storage.path.trim();
        if !configured.is_empty() {
            let p = PathBuf::from(configured);
            return Ok(if p.is_absolute() { p } else { base_dir.join(p) });
        }
        let dirs = directories::ProjectDirs::from("", "", "raffle").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "storage.path".into(),
                message: "no home directory found; set an explicit path".into(),
            }
        })?;
        Ok(dirs.data_dir().join(DB_FILE_NAME))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/raffle.toml` relative to `base_dir`.
///
/// Does not create the file; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("raffle.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Write the built-in defaults to `config/raffle.toml` unless the file
/// already exists. Returns the path when a file was created.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let target = config_dir.join("raffle.toml");
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Convenience wrapper: loads config relative to the current working
/// directory, creating it from defaults first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let labels: &[(&str, &str)] = &[
        ("event.title", config.event.title.as_str()),
        ("event.fallback_tier", config.event.fallback_tier.as_str()),
        ("event.exhausted_label", config.event.exhausted_label.as_str()),
    ];
    for (field, value) in labels {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: field.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    let poll = config.sync.poll_interval_ms;
    if !(MIN_POLL_MS..=MAX_POLL_MS).contains(&poll) {
        return Err(ConfigError::ValidationError {
            field: "sync.poll_interval_ms".into(),
            message: format!("must be between {MIN_POLL_MS} and {MAX_POLL_MS}, got {poll}"),
        });
    }

    if config.sync.hub_port == 0 {
        return Err(ConfigError::ValidationError {
            field: "sync.hub_port".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
