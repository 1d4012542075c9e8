//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::GatewayConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "influx-repo")]
use super::repositories::InfluxRepository;
#[cfg(feature = "mongo-repo")]
use super::repositories::MongoRepository;
use super::repository::{
    DictionaryRepository, RepositoryError, RepositoryResult, TimeSeriesRepository,
};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// InfluxDB + MongoDB servers
    Remote,
    /// In-memory local repository for both stores
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("remote", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "influx" | "mongo" => Ok(Self::Remote),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// Unset or unrecognised values fall back to Local.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// The pair of stores the gateway talks to.
#[derive(Clone)]
pub struct Repositories {
    pub time_series: Arc<dyn TimeSeriesRepository>,
    pub dictionaries: Arc<dyn DictionaryRepository>,
}

impl Repositories {
    /// Use one in-memory repository for both stores.
    pub fn from_local(repo: LocalRepository) -> Self {
        Self {
            time_series: Arc::new(repo.clone()),
            dictionaries: Arc::new(repo),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use df_gateway::db::{GatewayConfig, RepositoryFactory};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = GatewayConfig::load()?;
///     let repos = RepositoryFactory::create(&config).await?;
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create the repositories selected by `config`.
    pub async fn create(config: &GatewayConfig) -> RepositoryResult<Repositories> {
        match config.repository_type()? {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Remote => Self::create_remote(config).await,
        }
    }

    /// Create an in-memory local repository shared by both stores.
    pub fn create_local() -> Repositories {
        Repositories::from_local(LocalRepository::new())
    }

    /// Create the InfluxDB and MongoDB repositories.
    #[cfg(all(feature = "influx-repo", feature = "mongo-repo"))]
    pub async fn create_remote(config: &GatewayConfig) -> RepositoryResult<Repositories> {
        let influx = InfluxRepository::new(config.influx.clone())?;
        let mongo = MongoRepository::connect(&config.mongo).await?;
        Ok(Repositories {
            time_series: Arc::new(influx),
            dictionaries: Arc::new(mongo),
        })
    }

    /// Remote stores need the `remote-repo` feature.
    #[cfg(not(all(feature = "influx-repo", feature = "mongo-repo")))]
    pub async fn create_remote(config: &GatewayConfig) -> RepositoryResult<Repositories> {
        let _ = config;
        Err(RepositoryError::configuration(
            "Remote repositories require the 'remote-repo' feature",
        ))
    }
}
