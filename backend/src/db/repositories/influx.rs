//! InfluxDB v2 repository implementation over the HTTP API.
//!
//! Writes go to `/api/v2/write` as line protocol with nanosecond precision.
//! Reads post a Flux query to `/api/v2/query` and parse the CSV response.
//!
//! ## Configuration
//!
//! See [`InfluxConfig`]: `INFLUX_URL`, `INFLUX_TOKEN`, `INFLUX_ORG`,
//! `INFLUX_BUCKET`, `INFLUX_TAG_KEY`, `INFLUX_TIMEOUT_SECS`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::json;
use tracing::{debug, warn};

use crate::db::config::InfluxConfig;
use crate::db::line_protocol::encode_point;
use crate::db::query::RangeQuery;
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, StoreHealth, TimeSeriesRepository,
};
use crate::models::{MeasurementRecord, Point};
use crate::services::validation::parse_instant;

/// Time-series repository backed by an InfluxDB v2 server.
pub struct InfluxRepository {
    client: Client,
    config: InfluxConfig,
}

impl InfluxRepository {
    /// Create a repository with a shared HTTP client.
    ///
    /// No request is made here; an unreachable server shows up on the first
    /// operation or health check.
    pub fn new(config: InfluxConfig) -> RepositoryResult<Self> {
        config.validate().map_err(RepositoryError::configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RepositoryError::from(e).with_operation("build_client"))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn token_header(&self) -> String {
        format!("Token {}", self.config.token)
    }
}

/// Turn a non-success response into a query error carrying the body text.
async fn ensure_success(response: Response, operation: &str) -> RepositoryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    let mut context = ErrorContext::new(operation)
        .with_entity("influx")
        .with_details(format!("status={}", status.as_u16()));
    if status.is_server_error() {
        context = context.retryable();
    }
    Err(RepositoryError::query_with_context(message, context))
}

#[async_trait]
impl StoreHealth for InfluxRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let response = self
            .client
            .get(self.endpoint("/health"))
            .send()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("health_check"))?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl TimeSeriesRepository for InfluxRepository {
    async fn write_point(&self, point: &Point) -> RepositoryResult<()> {
        let line = encode_point(point).map_err(|e| e.with_operation("write_point"))?;
        debug!(measurement = %point.measurement, "writing point");

        let response = self
            .client
            .post(self.endpoint("/api/v2/write"))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, self.token_header())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("write_point"))?;

        ensure_success(response, "write_point").await?;
        Ok(())
    }

    async fn query_range(&self, query: &RangeQuery) -> RepositoryResult<Vec<MeasurementRecord>> {
        let flux = query.to_flux();
        debug!(%flux, "running range query");

        let body = json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "annotations": [],
                "delimiter": ","
            }
        });

        let response = self
            .client
            .post(self.endpoint("/api/v2/query"))
            .query(&[("org", self.config.org.as_str())])
            .header(AUTHORIZATION, self.token_header())
            .header(ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("query_range"))?;

        let csv = ensure_success(response, "query_range")
            .await?
            .text()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("query_range"))?;

        parse_flux_csv(&csv).map_err(|e| {
            warn!(error = %e, "could not decode query response");
            e.with_operation("query_range").with_entity("influx")
        })
    }
}

/// Column positions taken from the most recent header row.
struct Columns {
    time: Option<usize>,
    value: Option<usize>,
    field: Option<usize>,
    measurement: Option<usize>,
    error: Option<usize>,
}

impl Columns {
    fn from_header(row: &csv::StringRecord) -> Self {
        let find = |name: &str| row.iter().position(|c| c == name);
        Self {
            time: find("_time"),
            value: find("_value"),
            field: find("_field"),
            measurement: find("_measurement"),
            error: find("error"),
        }
    }
}

fn is_header(row: &csv::StringRecord) -> bool {
    let at = |i: usize| row.get(i).unwrap_or_default();
    (at(1) == "result" && at(2) == "table") || at(1) == "error"
}

fn cell<'a>(row: &'a csv::StringRecord, index: Option<usize>, name: &str) -> RepositoryResult<&'a str> {
    index
        .and_then(|i| row.get(i))
        .ok_or_else(|| RepositoryError::decode(format!("query response has no '{}' column", name)))
}

/// Parse an unannotated Flux CSV response into records.
///
/// Each table starts with its own header row; blank lines separate tables.
/// Rows are returned in response order.
pub fn parse_flux_csv(body: &str) -> RepositoryResult<Vec<MeasurementRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut columns: Option<Columns> = None;
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| RepositoryError::decode(format!("malformed CSV: {}", e)))?;
        if row.iter().all(str::is_empty) {
            columns = None;
            continue;
        }
        if columns.is_none() || is_header(&row) {
            columns = Some(Columns::from_header(&row));
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        if let Some(i) = cols.error {
            let message = row.get(i).unwrap_or("query failed");
            return Err(RepositoryError::query(message.to_string()));
        }

        let raw_time = cell(&row, cols.time, "_time")?;
        let time = parse_instant(raw_time)
            .ok_or_else(|| RepositoryError::decode(format!("invalid _time '{}'", raw_time)))?;
        let raw_value = cell(&row, cols.value, "_value")?;
        let value = raw_value
            .parse::<f64>()
            .map_err(|_| RepositoryError::decode(format!("non-numeric _value '{}'", raw_value)))?;

        records.push(MeasurementRecord {
            time,
            measurement: cell(&row, cols.measurement, "_measurement")?.to_string(),
            field: cell(&row, cols.field, "_field")?.to_string(),
            value,
        });
    }

    Ok(records)
}
