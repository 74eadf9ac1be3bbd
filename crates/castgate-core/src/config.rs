use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CastgateError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub debrid: DebridConfig,
    pub cast: CastConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebridConfig {
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastConfig {
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Overrides the platform data dir when set.
    pub path: Option<PathBuf>,
}

/// Which `LinkStore` implementation to run. Chosen here, at startup,
/// never by probing the runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
}

impl AppConfig {
    /// Load config: the user file when present, built-in defaults otherwise.
    pub fn load() -> Result<Self, CastgateError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            toml::from_str(&user_str).map_err(|e| CastgateError::Config(e.to_string()))
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CastgateError::Config(e.to_string()))
        }
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CastgateError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CastgateError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// The directory the link store lives in, honoring the config override.
    pub fn store_dir(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Ensure the store directory exists and return it.
    pub fn ensure_store_dir(&self) -> Result<PathBuf, CastgateError> {
        let dir = self.store_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "castgate")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.path.is_none());
        assert!(config.debrid.api_token.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.storage.backend, config.storage.backend);
    }

    #[test]
    fn test_backend_names() {
        let config: AppConfig = toml::from_str(
            r#"
            [debrid]
            api_token = "tok"
            [cast]
            api_token = "tok"
            [storage]
            backend = "json"
            path = "/tmp/castgate"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/castgate"));
    }
}
