//! Range query construction for the time-series store.
//!
//! A [`RangeQuery`] always covers the whole retention range and then narrows
//! by measurement, tag, lower bound, upper bound and row limit, in that order.
//! All filters are conjunctive. The in-memory store evaluates the struct
//! directly; the InfluxDB store renders it with [`RangeQuery::to_flux`].

use chrono::{DateTime, SecondsFormat, Utc};

use crate::services::validation::parse_instant;

/// Equality filter on one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

/// Reasons a range query cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Cannot use both \"count\" and \"to\" parameters.")]
    CountWithUpperBound,
    #[error("measurement must not be empty")]
    EmptyMeasurement,
    #[error("'{param}' is not an RFC 3339 timestamp: {value}")]
    InvalidTime { param: &'static str, value: String },
    #[error("'count' must be a positive integer, got '{0}'")]
    InvalidCount(String),
}

/// A filtered read over one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub bucket: String,
    pub measurement: String,
    pub tag: Option<TagFilter>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl RangeQuery {
    /// Build a query from raw request values.
    ///
    /// `to` and `count` are mutually exclusive: supplying both fails even if
    /// either is empty. Otherwise empty strings count as absent.
    pub fn build(
        bucket: &str,
        measurement: &str,
        tag: Option<TagFilter>,
        from: Option<&str>,
        to: Option<&str>,
        count: Option<&str>,
    ) -> Result<Self, QueryError> {
        if to.is_some() && count.is_some() {
            return Err(QueryError::CountWithUpperBound);
        }
        if measurement.is_empty() {
            return Err(QueryError::EmptyMeasurement);
        }

        let from = parse_bound("from_t", from)?;
        let to = parse_bound("to_t", to)?;
        let limit = match count.map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(QueryError::InvalidCount(raw.to_string())),
            },
        };

        Ok(Self {
            bucket: bucket.to_string(),
            measurement: measurement.to_string(),
            tag: tag.filter(|t| !t.value.is_empty()),
            from,
            to,
            limit,
        })
    }

    /// True when `time` falls inside the (inclusive) time bounds.
    pub fn contains_time(&self, time: &DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| *time >= from) && self.to.map_or(true, |to| *time <= to)
    }

    /// Render the query as a Flux expression.
    pub fn to_flux(&self) -> String {
        let mut flux = format!(
            "from(bucket: {})\n  |> range(start: 0)\n  |> filter(fn: (r) => r._measurement == {})",
            flux_string(&self.bucket),
            flux_string(&self.measurement),
        );

        if let Some(tag) = &self.tag {
            flux.push_str(&format!(
                "\n  |> filter(fn: (r) => r[{}] == {})",
                flux_string(&tag.key),
                flux_string(&tag.value)
            ));
        }
        if let Some(from) = &self.from {
            flux.push_str(&format!(
                "\n  |> filter(fn: (r) => r._time >= time(v: {}))",
                flux_string(&format_instant(from))
            ));
        }
        if let Some(to) = &self.to {
            flux.push_str(&format!(
                "\n  |> filter(fn: (r) => r._time <= time(v: {}))",
                flux_string(&format_instant(to))
            ));
        }
        if let Some(n) = self.limit {
            flux.push_str(&format!("\n  |> limit(n: {})", n));
        }

        flux
    }
}

fn parse_bound(
    param: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, QueryError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => parse_instant(value)
            .map(Some)
            .ok_or_else(|| QueryError::InvalidTime {
                param,
                value: value.to_string(),
            }),
    }
}

fn format_instant(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Quote a value as a Flux string literal.
fn flux_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            // `${` starts interpolation inside Flux strings.
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
