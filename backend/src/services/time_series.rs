//! Measurement writes and range reads.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::validation::{parse_write_command, validate_batch, validate_write_command};
use super::GatewayError;
use crate::db::query::{RangeQuery, TagFilter};
use crate::db::repository::TimeSeriesRepository;
use crate::models::{MeasurementRecord, Point, WriteCommand};

const WRITE_FAILURE: &str = "Failed to connect to the database.";
const READ_FAILURE: &str = "Failed to connect to the InfluxDB database.";
const NO_ROWS: &str = "Could not find measurement.";

/// Query parameters of a range read, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeParams {
    /// Tag value to match
    pub tags: Option<String>,
    /// Tag key to match `tags` against; defaults to the configured key
    pub tag_key: Option<String>,
    pub from_t: Option<String>,
    pub to_t: Option<String>,
    pub count: Option<String>,
}

/// Gateway in front of the time-series store.
#[derive(Clone)]
pub struct TimeSeriesGateway {
    repo: Arc<dyn TimeSeriesRepository>,
    bucket: String,
    default_tag_key: String,
}

impl TimeSeriesGateway {
    pub fn new(
        repo: Arc<dyn TimeSeriesRepository>,
        bucket: impl Into<String>,
        default_tag_key: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            bucket: bucket.into(),
            default_tag_key: default_tag_key.into(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn TimeSeriesRepository> {
        &self.repo
    }

    /// Validate a batch and write every point.
    ///
    /// Nothing is written unless the whole batch validates. Points are then
    /// written one by one; a failed point does not stop the rest, but any
    /// failure fails the call. Returns the number of points written.
    pub async fn write(&self, commands: &[WriteCommand]) -> Result<usize, GatewayError> {
        let points =
            validate_batch(commands, validate_write_command).map_err(GatewayError::InvalidCommand)?;
        self.write_points(&points).await
    }

    /// Like [`write`](Self::write), for a batch still in raw JSON form.
    pub async fn write_records(&self, records: Vec<Value>) -> Result<usize, GatewayError> {
        let points = validate_batch(records, |record| {
            parse_write_command(record).and_then(|command| validate_write_command(&command))
        })
        .map_err(GatewayError::InvalidCommand)?;
        self.write_points(&points).await
    }

    async fn write_points(&self, points: &[Point]) -> Result<usize, GatewayError> {
        debug!(points = points.len(), "writing batch");

        let mut first_failure = None;
        let mut failed = 0usize;
        for point in points {
            if let Err(e) = self.repo.write_point(point).await {
                warn!(
                    measurement = %point.measurement,
                    retryable = e.is_retryable(),
                    error = %e,
                    "point write failed"
                );
                failed += 1;
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(source) => {
                warn!(failed, total = points.len(), "batch write incomplete");
                Err(GatewayError::store(WRITE_FAILURE, source))
            }
            None => Ok(points.len()),
        }
    }

    /// Read every row of `measurement` matching `params`, in store order.
    pub async fn read(
        &self,
        measurement: &str,
        params: &RangeParams,
    ) -> Result<Vec<MeasurementRecord>, GatewayError> {
        let tag = params.tags.as_ref().map(|value| TagFilter {
            key: params
                .tag_key
                .clone()
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| self.default_tag_key.clone()),
            value: value.clone(),
        });

        let query = RangeQuery::build(
            &self.bucket,
            measurement,
            tag,
            params.from_t.as_deref(),
            params.to_t.as_deref(),
            params.count.as_deref(),
        )
        .map_err(|e| GatewayError::InvalidQuery(format!("Invalid request: {}", e)))?;

        let records = self.repo.query_range(&query).await.map_err(|e| {
            warn!(measurement, retryable = e.is_retryable(), error = %e, "range query failed");
            GatewayError::store(READ_FAILURE, e)
        })?;

        if records.is_empty() {
            return Err(GatewayError::NotFound(NO_ROWS.to_string()));
        }
        debug!(measurement, rows = records.len(), "range query complete");
        Ok(records)
    }
}
