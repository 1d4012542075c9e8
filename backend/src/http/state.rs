//! Application state for the HTTP server.

use crate::db::config::InfluxConfig;
use crate::db::factory::Repositories;
use crate::db::repositories::LocalRepository;
use crate::services::{DictionaryGateway, TimeSeriesGateway};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub time_series: TimeSeriesGateway,
    pub dictionaries: DictionaryGateway,
}

impl AppState {
    /// Build the gateways over `repos`, taking bucket and tag key from `influx`.
    pub fn new(repos: Repositories, influx: &InfluxConfig) -> Self {
        Self {
            time_series: TimeSeriesGateway::new(repos.time_series, &influx.bucket, &influx.tag_key),
            dictionaries: DictionaryGateway::new(repos.dictionaries),
        }
    }

    /// State over one in-memory repository with default settings.
    pub fn local(repo: LocalRepository) -> Self {
        Self::new(Repositories::from_local(repo), &InfluxConfig::default())
    }
}
