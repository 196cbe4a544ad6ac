use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::DirectoryLayout;

pub const SQLITE_DATABASE_TYPE: &str = "sqlite";
/// Scratch sessions: nothing outlives the process.
pub const MEMORY_DATABASE_TYPE: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported database type '{0}'; use 'sqlite' or 'memory'")]
    UnsupportedDatabase(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            kind: SQLITE_DATABASE_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub diary: DiarySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarySettings {
    /// Directory name of the diary opened when the TUI starts; empty for none.
    pub auto_open_diary_on_startup: String,
    pub auto_open_on_creation: bool,
}

impl Config {
    pub fn defaults_for(layout: &DirectoryLayout) -> Self {
        let mut config = Self::default();
        config.database.url = layout.default_database_path().display().to_string();
        config
    }

    /// Reads `<home>/config.toml`, writing the defaults first when it does not exist.
    pub fn load_or_create(layout: &DirectoryLayout) -> Result<Self, ConfigError> {
        let path = layout.config_path();
        if !path.exists() {
            let config = Self::defaults_for(layout);
            config.save(&path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            return Ok(config);
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml(&raw, &path)?;
        if config.database.url.trim().is_empty() {
            config.database.url = layout.default_database_path().display().to_string();
        }
        Ok(config)
    }

    pub(crate) fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if ![SQLITE_DATABASE_TYPE, MEMORY_DATABASE_TYPE].contains(&config.database.kind.as_str()) {
            return Err(ConfigError::UnsupportedDatabase(config.database.kind));
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn auto_open_diary(&self) -> Option<&str> {
        let name = self.settings.diary.auto_open_diary_on_startup.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
