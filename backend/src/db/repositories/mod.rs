//! Repository implementations module.
//!
//! - `local`: In-memory implementation of both store traits for unit testing and local development
//! - `influx`: InfluxDB v2 time-series store over HTTP
//! - `mongo`: MongoDB dictionary store
#[cfg(feature = "influx-repo")]
pub mod influx;
pub mod local;
#[cfg(feature = "mongo-repo")]
pub mod mongo;

#[cfg(feature = "influx-repo")]
pub use influx::InfluxRepository;
pub use local::LocalRepository;
#[cfg(feature = "mongo-repo")]
pub use mongo::MongoRepository;
