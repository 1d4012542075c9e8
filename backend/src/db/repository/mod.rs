//! Repository traits for the two backing stores.
//!
//! The gateways only ever see these traits, so the in-memory store used by
//! tests and the network stores used in production are interchangeable.

use async_trait::async_trait;

use super::query::RangeQuery;
use crate::models::{
    DataDictionaryEntry, DataItemFilter, EquipmentDictionaryEntry, EquipmentFilter,
    MeasurementRecord, Point,
};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Liveness probe shared by every store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Returns `Ok(true)` when the store answers, `Ok(false)` when it answers
    /// but reports itself unhealthy.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Measurement storage.
#[async_trait]
pub trait TimeSeriesRepository: StoreHealth {
    /// Write one point. Batches are split by the caller so that each point
    /// succeeds or fails on its own.
    async fn write_point(&self, point: &Point) -> RepositoryResult<()>;

    /// Run a range query, returning rows in the store's iteration order.
    async fn query_range(&self, query: &RangeQuery) -> RepositoryResult<Vec<MeasurementRecord>>;
}

/// Equipment and data-item dictionary storage.
#[async_trait]
pub trait DictionaryRepository: StoreHealth {
    /// Insert a batch of data-item entries in a single store call.
    async fn insert_data_items(&self, entries: &[DataDictionaryEntry]) -> RepositoryResult<()>;

    async fn find_data_items(
        &self,
        filter: &DataItemFilter,
    ) -> RepositoryResult<Vec<DataDictionaryEntry>>;

    /// Insert a batch of equipment entries in a single store call.
    async fn insert_equipment(&self, entries: &[EquipmentDictionaryEntry])
        -> RepositoryResult<()>;

    async fn find_equipment(
        &self,
        filter: &EquipmentFilter,
    ) -> RepositoryResult<Vec<EquipmentDictionaryEntry>>;
}
