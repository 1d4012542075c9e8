//! Gateway configuration file support.
//!
//! Settings come from a `gateway.toml` file when one is found, then
//! environment variables override individual values. Without a file the
//! defaults plus environment are used.
//!
//! ```toml
//! [repository]
//! type = "remote"
//!
//! [influx]
//! url = "http://influx:8086"
//! token = "..."
//!
//! [mongo]
//! uri = "mongodb://mongo:27017"
//!
//! [server]
//! port = 8080
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::config::{InfluxConfig, MongoConfig, ServerConfig};
use super::factory::RepositoryType;
use super::repository::RepositoryError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG";

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub influx: InfluxConfig,
    #[serde(default)]
    pub mongo: MongoConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file, without environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find the configuration file, if any.
    ///
    /// `GATEWAY_CONFIG` wins and must exist when set. Otherwise `gateway.toml`
    /// is searched in the current directory, `backend/` and the parent.
    pub fn locate() -> Result<Option<PathBuf>, RepositoryError> {
        if let Ok(explicit) = env::var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(explicit);
            if !path.exists() {
                return Err(RepositoryError::configuration(format!(
                    "{} points to a missing file: {}",
                    CONFIG_PATH_VAR,
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        let search_paths = [
            PathBuf::from("gateway.toml"),
            PathBuf::from("backend/gateway.toml"),
            PathBuf::from("../gateway.toml"),
        ];
        Ok(search_paths.into_iter().find(|p| p.exists()))
    }

    /// Load from the located file (or defaults) and apply the environment.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = match Self::locate()? {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables onto every section.
    pub fn apply_env(&mut self) -> Result<(), RepositoryError> {
        if let Ok(repo_type) = env::var("REPOSITORY_TYPE") {
            if !repo_type.is_empty() {
                self.repository.repo_type = repo_type;
            }
        }
        self.influx
            .apply_env()
            .map_err(RepositoryError::configuration)?;
        self.mongo.apply_env();
        self.server
            .apply_env()
            .map_err(RepositoryError::configuration)?;
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, RepositoryError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })
    }
}
