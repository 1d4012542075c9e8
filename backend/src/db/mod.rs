//! Store access for the gateway.
//!
//! This module provides abstractions for the two backing stores via the Repository
//! pattern, allowing the in-memory and network backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (http)                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Gateways (services) - validation, status mapping       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┼──────────────────┐
//!     │               │                  │
//!  Local           InfluxDB           MongoDB
//! (in-memory)    (time series)     (dictionaries)
//! ```
//!
//! - `query`: range query construction and Flux rendering
//! - `line_protocol`: point encoding for InfluxDB writes
//! - `repository`: trait definitions and error types
//! - `repositories`: the implementations
//! - `factory` / `repo_config` / `config`: selecting and configuring backends

#[cfg(not(any(feature = "local-repo", feature = "influx-repo", feature = "mongo-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod config;
pub mod factory;
pub mod line_protocol;
pub mod query;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use config::{InfluxConfig, MongoConfig, ServerConfig};
pub use factory::{Repositories, RepositoryFactory, RepositoryType};
pub use query::{QueryError, RangeQuery, TagFilter};
pub use repo_config::GatewayConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "influx-repo")]
pub use repositories::InfluxRepository;
#[cfg(feature = "mongo-repo")]
pub use repositories::MongoRepository;
pub use repository::{
    DictionaryRepository, ErrorContext, RepositoryError, RepositoryResult, StoreHealth,
    TimeSeriesRepository,
};
