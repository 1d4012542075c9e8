//! Measurement data exchanged with the time-series store.
//!
//! A [`WriteCommand`] is what clients post; it is validated into a [`Point`]
//! before anything is sent to the store. Reads come back as a flat list of
//! [`MeasurementRecord`]s, one per (row, field) pair.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A field value as it arrives on the wire.
///
/// Clients send plain numbers, but also numeric strings (values scraped from
/// agent XML are strings). Both are accepted and coerced to `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce to a float. Returns `None` for non-numeric text and for
    /// NaN/infinite values, which the store cannot represent.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(v) => *v,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One write command from a `POST /data/write` batch.
///
/// Every member is optional at the serde level so that a command missing its
/// measurement or fields reaches validation and is rejected there, instead of
/// failing deserialization of the whole batch with a less useful message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteCommand {
    #[serde(default)]
    pub measurement: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub fields: Option<BTreeMap<String, FieldValue>>,
    /// RFC 3339 instant. The store assigns its own time when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl WriteCommand {
    /// Convenience constructor used by tests and clients.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: Some(measurement.into()),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// A validated, store-ready point: tags, float fields and an optional time.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One (row, field) pair returned by a range read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub time: DateTime<Utc>,
    pub measurement: String,
    pub field: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_coercion() {
        assert_eq!(FieldValue::Number(3.0).as_f64(), Some(3.0));
        assert_eq!(FieldValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(FieldValue::from("value1").as_f64(), None);
        assert_eq!(FieldValue::from("NaN").as_f64(), None);
        assert_eq!(FieldValue::from("inf").as_f64(), None);
    }

    #[test]
    fn test_write_command_accepts_integers_and_strings() {
        let json = r#"{"measurement":"Position","tags":{"dataItemId":"x1"},"fields":{"a":3,"b":"4.5"}}"#;
        let command: WriteCommand = serde_json::from_str(json).unwrap();

        let fields = command.fields.unwrap();
        assert_eq!(fields["a"].as_f64(), Some(3.0));
        assert_eq!(fields["b"].as_f64(), Some(4.5));
        assert_eq!(command.tags.unwrap()["dataItemId"], "x1");
        assert!(command.timestamp.is_none());
    }

    #[test]
    fn test_write_command_missing_members_deserialize_as_none() {
        let command: WriteCommand = serde_json::from_str(r#"{"fields":{"a":1}}"#).unwrap();
        assert!(command.measurement.is_none());

        let command: WriteCommand = serde_json::from_str(r#"{"measurement":"m"}"#).unwrap();
        assert!(command.fields.is_none());
    }

    #[test]
    fn test_measurement_record_serializes_rfc3339_time() {
        let record = MeasurementRecord {
            time: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            measurement: "Position".to_string(),
            field: "value".to_string(),
            value: 1.5,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time"], "2024-03-01T10:00:00Z");
        assert_eq!(json["value"], 1.5);
    }
}
