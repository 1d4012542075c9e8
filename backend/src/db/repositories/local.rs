//! In-memory local repository implementation.
//!
//! This module provides a local implementation of both store traits suitable
//! for unit testing and local development. Measurements are kept per series
//! (measurement, field, tag set) in time order, which mirrors how the real
//! time-series store groups and orders query output.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::db::query::RangeQuery;
use crate::db::repository::*;
use crate::models::{
    DataDictionaryEntry, DataItemFilter, EquipmentDictionaryEntry, EquipmentFilter,
    MeasurementRecord, Point,
};

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same data, so a test can keep a
/// handle for inspection after handing one to the application state.
///
/// # Example
/// ```
/// use df_gateway::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// repo.set_healthy(false);
/// assert_eq!(repo.point_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    measurement: String,
    field: String,
    tags: BTreeMap<String, String>,
}

struct LocalData {
    series: BTreeMap<SeriesKey, BTreeMap<DateTime<Utc>, f64>>,
    data_items: Vec<DataDictionaryEntry>,
    equipment: Vec<EquipmentDictionaryEntry>,

    // Failure injection
    is_healthy: bool,
    rejected_measurements: HashSet<String>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            series: BTreeMap::new(),
            data_items: Vec::new(),
            equipment: Vec::new(),
            is_healthy: true,
            rejected_measurements: HashSet::new(),
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make every write of `measurement` fail while other writes succeed.
    pub fn reject_writes_for(&self, measurement: impl Into<String>) {
        self.data
            .write()
            .rejected_measurements
            .insert(measurement.into());
    }

    /// Number of stored (series, timestamp) values.
    pub fn point_count(&self) -> usize {
        self.data.read().series.values().map(BTreeMap::len).sum()
    }

    pub fn data_item_count(&self) -> usize {
        self.data.read().data_items.len()
    }

    pub fn equipment_count(&self) -> usize {
        self.data.read().equipment.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Local repository is not healthy")
                .with_operation(operation)
                .with_entity("local"));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

#[async_trait]
impl TimeSeriesRepository for LocalRepository {
    async fn write_point(&self, point: &Point) -> RepositoryResult<()> {
        self.check_health("write_point")?;

        let mut data = self.data.write();
        if data.rejected_measurements.contains(&point.measurement) {
            return Err(RepositoryError::query_with_context(
                format!("write rejected for measurement '{}'", point.measurement),
                ErrorContext::new("write_point").with_entity("local"),
            ));
        }

        // The store stamps points that arrive without a time.
        let time = point.timestamp.unwrap_or_else(Utc::now);
        for (field, value) in &point.fields {
            let key = SeriesKey {
                measurement: point.measurement.clone(),
                field: field.clone(),
                tags: point.tags.clone(),
            };
            data.series.entry(key).or_default().insert(time, *value);
        }
        Ok(())
    }

    async fn query_range(&self, query: &RangeQuery) -> RepositoryResult<Vec<MeasurementRecord>> {
        self.check_health("query_range")?;

        let data = self.data.read();
        let limit = query
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        let records = data
            .series
            .iter()
            .filter(|(key, _)| key.measurement == query.measurement)
            .filter(|(key, _)| match &query.tag {
                Some(tag) => key.tags.get(&tag.key) == Some(&tag.value),
                None => true,
            })
            .flat_map(|(key, values)| {
                // Limits apply per series, as they do per table in the store.
                values
                    .iter()
                    .filter(|(time, _)| query.contains_time(time))
                    .take(limit)
                    .map(move |(time, value)| MeasurementRecord {
                        time: *time,
                        measurement: key.measurement.clone(),
                        field: key.field.clone(),
                        value: *value,
                    })
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl DictionaryRepository for LocalRepository {
    async fn insert_data_items(&self, entries: &[DataDictionaryEntry]) -> RepositoryResult<()> {
        self.check_health("insert_data_items")?;
        self.data.write().data_items.extend_from_slice(entries);
        Ok(())
    }

    async fn find_data_items(
        &self,
        filter: &DataItemFilter,
    ) -> RepositoryResult<Vec<DataDictionaryEntry>> {
        self.check_health("find_data_items")?;
        Ok(self
            .data
            .read()
            .data_items
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }

    async fn insert_equipment(
        &self,
        entries: &[EquipmentDictionaryEntry],
    ) -> RepositoryResult<()> {
        self.check_health("insert_equipment")?;
        self.data.write().equipment.extend_from_slice(entries);
        Ok(())
    }

    async fn find_equipment(
        &self,
        filter: &EquipmentFilter,
    ) -> RepositoryResult<Vec<EquipmentDictionaryEntry>> {
        self.check_health("find_equipment")?;
        Ok(self
            .data
            .read()
            .equipment
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::TagFilter;
    use crate::services::validation::parse_instant;

    fn point(measurement: &str, item: &str, time: &str, value: f64) -> Point {
        Point {
            measurement: measurement.to_string(),
            tags: BTreeMap::from([("dataItemId".to_string(), item.to_string())]),
            fields: BTreeMap::from([("value".to_string(), value)]),
            timestamp: parse_instant(time),
        }
    }

    fn query(tag: Option<&str>, count: Option<&str>) -> RangeQuery {
        let tag = tag.map(|v| TagFilter {
            key: "dataItemId".to_string(),
            value: v.to_string(),
        });
        RangeQuery::build("b", "Position", tag, None, None, count).unwrap()
    }

    #[tokio::test]
    async fn test_rows_follow_series_then_time_order() {
        let repo = LocalRepository::new();
        repo.write_point(&point("Position", "y", "2024-01-01T00:00:02Z", 2.0)).await.unwrap();
        repo.write_point(&point("Position", "x", "2024-01-01T00:00:03Z", 3.0)).await.unwrap();
        repo.write_point(&point("Position", "x", "2024-01-01T00:00:01Z", 1.0)).await.unwrap();
        repo.write_point(&point("Load", "x", "2024-01-01T00:00:01Z", 9.0)).await.unwrap();

        let rows = repo.query_range(&query(None, None)).await.unwrap();
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 3.0, 2.0]);
    }

    #[tokio::test]
    async fn test_tag_filter_and_per_series_limit() {
        let repo = LocalRepository::new();
        for (i, item) in ["x", "x", "x", "y"].iter().enumerate() {
            let time = format!("2024-01-01T00:00:0{}Z", i);
            repo.write_point(&point("Position", item, &time, i as f64)).await.unwrap();
        }

        assert_eq!(repo.query_range(&query(Some("x"), None)).await.unwrap().len(), 3);
        assert_eq!(repo.query_range(&query(None, Some("1"))).await.unwrap().len(), 2);
        assert!(repo.query_range(&query(Some("z"), None)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_series_and_time_overwrites() {
        let repo = LocalRepository::new();
        repo.write_point(&point("Position", "x", "2024-01-01T00:00:00Z", 1.0)).await.unwrap();
        repo.write_point(&point("Position", "x", "2024-01-01T00:00:00Z", 5.0)).await.unwrap();

        assert_eq!(repo.point_count(), 1);
        let rows = repo.query_range(&query(None, None)).await.unwrap();
        assert_eq!(rows[0].value, 5.0);
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_everything() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);

        assert!(!repo.health_check().await.unwrap());
        let err = repo
            .write_point(&point("Position", "x", "2024-01-01T00:00:00Z", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert!(repo.find_data_items(&DataItemFilter::All).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_measurement_only_fails_that_measurement() {
        let repo = LocalRepository::new();
        repo.reject_writes_for("Broken");

        assert!(repo
            .write_point(&point("Broken", "x", "2024-01-01T00:00:00Z", 1.0))
            .await
            .is_err());
        assert!(repo
            .write_point(&point("Position", "x", "2024-01-01T00:00:00Z", 1.0))
            .await
            .is_ok());
        assert_eq!(repo.point_count(), 1);
    }
}
