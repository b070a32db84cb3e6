// Configuration loading and parsing (dugout.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Built-in configuration, used when no file is found.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/dugout.toml");

pub const CONFIG_FILE_NAME: &str = "dugout.toml";

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
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// The assembled configuration. Every section is optional in the file;
/// missing sections and keys take the built-in values.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub qualification: QualificationConfig,
    pub career: CareerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub sport_id: u32,
    /// Maximum rows requested for a season population.
    pub population_limit: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://statsapi.mlb.com".into(),
            sport_id: 1,
            population_limit: 2000,
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub long_ttl_secs: u64,
    pub short_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            long_ttl_secs: 30 * 60,
            short_ttl_secs: 5 * 60,
        }
    }
}

impl CacheConfig {
    pub fn long_ttl(&self) -> Duration {
        Duration::from_secs(self.long_ttl_secs)
    }

    pub fn short_ttl(&self) -> Duration {
        Duration::from_secs(self.short_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualificationConfig {
    pub min_plate_appearances: f64,
    pub min_innings_pitched: f64,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        QualificationConfig {
            min_plate_appearances: 200.0,
            min_innings_pitched: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CareerConfig {
    pub min_sample: usize,
}

impl Default for CareerConfig {
    fn default() -> Self {
        CareerConfig { min_sample: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub filter: String,
    /// Log directory. Relative paths resolve against the platform data dir.
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "dugout=info,warn".into(),
            dir: PathBuf::from("logs"),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        if self.dir.is_absolute() {
            return self.dir.clone();
        }
        match project_dirs() {
            Some(dirs) => dirs.data_dir().join(&self.dir),
            None => self.dir.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from an explicit file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config = parse_config(&text, path)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Otherwise `dugout.toml` in the platform
/// config directory is used when present, and the built-in defaults when
/// not.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => builtin_config(),
    }
}

/// The built-in configuration, parsed and validated.
pub fn builtin_config() -> Result<Config, ConfigError> {
    let config = parse_config(DEFAULT_CONFIG, Path::new("<built-in>"))?;
    validate(&config)?;
    Ok(config)
}

/// Where `load_config(None)` looks for a config file.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "dugout")
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let api = &config.api;
    if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!("must be an http(s) URL, got {:?}", api.base_url),
        });
    }

    let positive: &[(&str, u64)] = &[
        ("api.population_limit", u64::from(api.population_limit)),
        ("api.timeout_secs", api.timeout_secs),
        ("cache.long_ttl_secs", config.cache.long_ttl_secs),
        ("cache.short_ttl_secs", config.cache.short_ttl_secs),
        ("career.min_sample", config.career.min_sample as u64),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.cache.short_ttl_secs > config.cache.long_ttl_secs {
        return Err(ConfigError::ValidationError {
            field: "cache.short_ttl_secs".into(),
            message: format!(
                "must not exceed cache.long_ttl_secs ({})",
                config.cache.long_ttl_secs
            ),
        });
    }

    let q = &config.qualification;
    let thresholds: &[(&str, f64)] = &[
        ("qualification.min_plate_appearances", q.min_plate_appearances),
        ("qualification.min_innings_pitched", q.min_innings_pitched),
    ];
    for (name, val) in thresholds {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a non-negative number, got {val}"),
            });
        }
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
