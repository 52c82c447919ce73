//! Application configuration.
//!
//! The config file is found in this order:
//! 1. `--config` command-line argument
//! 2. `REKON_CONFIG` environment variable
//! 3. `<config dir>/rekon/config.toml` (when it exists)
//! 4. compiled defaults
//!
//! ```toml
//! database = "inventory.db"
//! base_songs_path = "z:\\songs"
//! snapshot_log = "logs/songs_dir.txt"
//!
//! [reconcile]
//! unclassified_genre_id = 18
//!
//! [reconcile.drive_map]
//! "b:" = "z:"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use rekon_core::ReconcileConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "REKON_CONFIG";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Argument(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Argument(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserFile(p) => Some(p.as_path()),
            ConfigSource::Defaults => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite inventory
    pub database: PathBuf,
    /// Root of the mounted library, walked for untracked files
    pub base_songs_path: Option<PathBuf>,
    /// Directory listing captured on the playout server
    pub snapshot_log: Option<PathBuf>,
    /// JSON tag cache written by `rekon snapshot`
    pub metadata_snapshot: Option<PathBuf>,
    /// Threads for snapshot generation
    pub snapshot_workers: Option<usize>,
    pub reconcile: ReconcileConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_data_dir().join("inventory.db"),
            base_songs_path: None,
            snapshot_log: None,
            metadata_snapshot: None,
            snapshot_workers: Some(20),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl AppConfig {
    /// Locate and load the configuration
    ///
    /// # Arguments
    /// * `cli_path` - Value of `--config`, if given
    pub fn load(cli_path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let source = resolve_config_source(
            cli_path,
            std::env::var(CONFIG_ENV).ok().as_deref(),
            user_config_path(),
        );
        let config = match source.path() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok((config, source))
    }

    /// Load a config file; relative paths inside it are taken relative to
    /// the file's directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;

        if let Some(base) = path.parent() {
            config.anchor_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<string>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_workers == Some(0) {
            return Err(ConfigError::Invalid("snapshot_workers must be at least 1".into()));
        }
        if self.reconcile.unclassified_genre_id <= 0 {
            return Err(ConfigError::Invalid(
                "reconcile.unclassified_genre_id must be positive".into(),
            ));
        }
        if self.reconcile.drive_map.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid("reconcile.drive_map has an empty prefix".into()));
        }
        Ok(())
    }

    fn anchor_paths(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        anchor(&mut self.database);
        for path in [
            &mut self.base_songs_path,
            &mut self.snapshot_log,
            &mut self.metadata_snapshot,
        ]
        .into_iter()
        .flatten()
        {
            anchor(path);
        }
    }
}

/// Pick the config file by priority; the user file only counts when present
pub fn resolve_config_source(
    cli_path: Option<&Path>,
    env_value: Option<&str>,
    user_file: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = cli_path {
        return ConfigSource::Argument(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return ConfigSource::Environment(PathBuf::from(value));
    }
    match user_file {
        Some(path) if path.is_file() => ConfigSource::UserFile(path),
        _ => ConfigSource::Defaults,
    }
}

/// `<config dir>/rekon/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rekon").join("config.toml"))
}

/// OS-dependent data directory for the default database location
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rekon"))
        .unwrap_or_else(|| PathBuf::from("./rekon_data"))
}
