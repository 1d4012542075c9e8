//! # DF Gateway
//!
//! HTTP gateway in front of the digital-factory data stores.
//!
//! Clients post sensor measurements and read them back by time range; they
//! also maintain two dictionaries describing equipment and the data items each
//! device reports. Measurements live in InfluxDB, dictionaries in MongoDB.
//! Both stores sit behind repository traits, with an in-memory implementation
//! for tests and local development.
//!
//! ## Architecture
//!
//! - [`models`]: Wire and store records
//! - [`services`]: Validation and the two gateways (time series, dictionaries)
//! - [`db`]: Repository traits, implementations, query building and configuration
//! - [`http`]: Axum router and handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
