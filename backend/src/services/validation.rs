//! Payload validation for write batches and dictionary entries.
//!
//! Validation turns loosely-typed request bodies into typed records or a
//! structured [`Rejection`]. Batches are all-or-nothing: the first invalid
//! record rejects the whole batch, whatever its position.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{DictionaryRecord, Point, WriteCommand, NULL_SENTINEL};

/// Why a single record was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("'{0}' must not be empty")]
    Empty(String),
    #[error("field '{field}' must be {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A batch refused because of one of its records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {index}: {reason}")]
pub struct BatchRejection {
    /// Zero-based position of the first invalid record.
    pub index: usize,
    pub reason: Rejection,
}

/// True iff every name in `required` is a key of `record`.
///
/// Presence is all that is checked; the value may be anything, null included.
pub fn validate_required_fields(record: &Map<String, Value>, required: &[&str]) -> bool {
    required.iter().all(|field| record.contains_key(*field))
}

/// Replace explicitly-null optional fields with the `"null"` sentinel, in place.
pub fn normalize_optional_fields(record: &mut Map<String, Value>, optional: &[&str]) {
    for field in optional {
        if let Some(value) = record.get_mut(*field) {
            if value.is_null() {
                *value = Value::String(NULL_SENTINEL.to_string());
            }
        }
    }
}

/// Apply `validate` to every record, stopping at the first rejection.
pub fn validate_batch<I, T, F>(records: I, mut validate: F) -> Result<Vec<T>, BatchRejection>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<T, Rejection>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| validate(record).map_err(|reason| BatchRejection { index, reason }))
        .collect()
}

/// Decode one raw batch element into a write command.
///
/// Members of the wrong JSON type (a numeric measurement, a boolean field
/// value) are refused here rather than failing the whole request body.
pub fn parse_write_command(record: Value) -> Result<WriteCommand, Rejection> {
    if !record.is_object() {
        return Err(Rejection::NotAnObject);
    }
    serde_json::from_value(record).map_err(|e| Rejection::Malformed(e.to_string()))
}

/// Validate a write command and translate it into a store point.
///
/// Every field value becomes an `f64`, whatever its JSON type, as long as it
/// is numeric.
pub fn validate_write_command(command: &WriteCommand) -> Result<Point, Rejection> {
    let measurement = match command.measurement.as_deref() {
        None => return Err(Rejection::MissingField("measurement".to_string())),
        Some("") => return Err(Rejection::Empty("measurement".to_string())),
        Some(m) => m.to_string(),
    };
    // A leading '#' turns the whole line into a comment the store skips.
    if measurement.starts_with('#') || has_control(&measurement) {
        return Err(Rejection::InvalidValue {
            field: "measurement".to_string(),
            expected: "free of control characters and not starting with '#'",
        });
    }
    if let Some(tags) = &command.tags {
        if let Some((key, _)) = tags
            .iter()
            .find(|(key, value)| has_control(key) || has_control(value))
        {
            return Err(Rejection::InvalidValue {
                field: format!("tags.{}", key.escape_debug()),
                expected: "free of control characters",
            });
        }
    }

    let raw_fields = match &command.fields {
        None => return Err(Rejection::MissingField("fields".to_string())),
        Some(f) if f.is_empty() => return Err(Rejection::Empty("fields".to_string())),
        Some(f) => f,
    };

    if let Some(key) = raw_fields.keys().find(|key| has_control(key)) {
        return Err(Rejection::InvalidValue {
            field: format!("fields.{}", key.escape_debug()),
            expected: "a key free of control characters",
        });
    }

    let fields = raw_fields
        .iter()
        .map(|(key, value)| {
            value
                .as_f64()
                .map(|v| (key.clone(), v))
                .ok_or_else(|| Rejection::InvalidValue {
                    field: key.clone(),
                    expected: "a finite number or numeric string",
                })
        })
        .collect::<Result<_, _>>()?;

    let timestamp = command
        .timestamp
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| parse_instant(t).ok_or_else(|| Rejection::InvalidValue {
            field: "timestamp".to_string(),
            expected: "an RFC 3339 timestamp",
        }))
        .transpose()?;

    Ok(Point {
        measurement,
        tags: command.tags.clone().unwrap_or_default(),
        fields,
        timestamp,
    })
}

/// Validate one raw dictionary record and build the typed entry.
///
/// Required fields must be present; optional nulls become the sentinel.
/// Strings are kept as-is and numbers/booleans are stringified. A required
/// field holding null, an object or an array is refused.
pub fn validate_dictionary_entry<T: DictionaryRecord>(record: Value) -> Result<T, Rejection> {
    let Value::Object(mut record) = record else {
        return Err(Rejection::NotAnObject);
    };

    if !validate_required_fields(&record, T::REQUIRED_FIELDS) {
        let missing = T::REQUIRED_FIELDS
            .iter()
            .find(|field| !record.contains_key(**field))
            .copied()
            .unwrap_or_default();
        return Err(Rejection::MissingField(missing.to_string()));
    }

    normalize_optional_fields(&mut record, T::OPTIONAL_FIELDS);

    // Refused here with 402; the document store would otherwise cast or
    // reject these values itself at insert time.
    let required = T::REQUIRED_FIELDS
        .iter()
        .map(|field| {
            record
                .get(*field)
                .and_then(coerce_to_string)
                .ok_or_else(|| Rejection::InvalidValue {
                    field: (*field).to_string(),
                    expected: "a string",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let optional = T::OPTIONAL_FIELDS
        .iter()
        .map(|field| match record.get(*field) {
            None => Ok(NULL_SENTINEL.to_string()),
            Some(value) => coerce_to_string(value).ok_or_else(|| Rejection::InvalidValue {
                field: (*field).to_string(),
                expected: "a string or null",
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(T::from_fields(required, optional))
}

/// Line breaks would split one point into several lines on the wire.
fn has_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}

fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse an RFC 3339 instant into UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataDictionaryEntry, EquipmentDictionaryEntry};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_fields_accept_null_values() {
        let record = object(json!({"category": null, "id": "i1", "deviceUUID": "u1"}));
        assert!(validate_required_fields(&record, &["category", "id", "deviceUUID"]));
        assert!(!validate_required_fields(&record, &["category", "name"]));
    }

    #[test]
    fn test_normalize_optional_fields_only_touches_nulls() {
        let mut record = object(json!({"name": null, "type": "SAMPLE", "id": null}));
        normalize_optional_fields(&mut record, &["name", "type"]);

        assert_eq!(record["name"], "null");
        assert_eq!(record["type"], "SAMPLE");
        assert!(record["id"].is_null());
    }

    #[test]
    fn test_write_command_becomes_float_point() {
        let command = WriteCommand::new("Position")
            .with_tag("dataItemId", "x1")
            .with_field("value", "12")
            .with_timestamp("2024-03-01T10:00:00.5+01:00");

        let point = validate_write_command(&command).unwrap();
        assert_eq!(point.measurement, "Position");
        assert_eq!(point.fields["value"], 12.0);
        assert_eq!(point.tags["dataItemId"], "x1");
        assert_eq!(
            point.timestamp.unwrap().to_rfc3339(),
            "2024-03-01T09:00:00.500+00:00"
        );
    }

    #[test]
    fn test_write_command_rejections() {
        let no_fields = WriteCommand::new("m");
        assert_eq!(
            validate_write_command(&no_fields),
            Err(Rejection::MissingField("fields".into()))
        );

        let empty_measurement = WriteCommand::new("").with_field("a", 1.0);
        assert_eq!(
            validate_write_command(&empty_measurement),
            Err(Rejection::Empty("measurement".into()))
        );

        let mut empty_fields = WriteCommand::new("m");
        empty_fields.fields = Some(Default::default());
        assert_eq!(
            validate_write_command(&empty_fields),
            Err(Rejection::Empty("fields".into()))
        );

        let text = WriteCommand::new("m").with_field("a", "value1");
        assert!(matches!(
            validate_write_command(&text),
            Err(Rejection::InvalidValue { .. })
        ));

        let bad_time = WriteCommand::new("m")
            .with_field("a", 1.0)
            .with_timestamp("yesterday");
        assert!(matches!(
            validate_write_command(&bad_time),
            Err(Rejection::InvalidValue { field, .. }) if field == "timestamp"
        ));
    }

    #[test]
    fn test_write_command_cannot_split_into_several_lines() {
        let rejected = |command: WriteCommand, field: &str| {
            match validate_write_command(&command) {
                Err(Rejection::InvalidValue { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected rejection of {}, got {:?}", field, other),
            }
        };

        rejected(WriteCommand::new("Load\nEvil").with_field("value", 99.0), "measurement");
        rejected(WriteCommand::new("#Load").with_field("value", 1.0), "measurement");
        rejected(
            WriteCommand::new("Load")
                .with_tag("dataItemId", "x1 value=1\nOther")
                .with_field("value", 2.0),
            "tags.dataItemId",
        );
        rejected(
            WriteCommand::new("Load").with_tag("a\rb", "x").with_field("value", 2.0),
            "tags.a\\rb",
        );
        rejected(WriteCommand::new("Load").with_field("v\talue", 2.0), "fields.v\\talue");

        // Escapable characters are still fine.
        let ok = WriteCommand::new("Load, Hall A")
            .with_tag("data Item", "x=1")
            .with_field("peak value", 2.0);
        assert!(validate_write_command(&ok).is_ok());
    }

    #[test]
    fn test_parse_write_command_type_errors() {
        let ok = parse_write_command(json!({"measurement": "m", "fields": {"a": "1"}})).unwrap();
        assert_eq!(ok.measurement.as_deref(), Some("m"));

        assert_eq!(parse_write_command(json!(5)), Err(Rejection::NotAnObject));
        assert!(matches!(
            parse_write_command(json!({"measurement": "m", "fields": {"a": true}})),
            Err(Rejection::Malformed(_))
        ));
    }

    #[test]
    fn test_batch_rejects_on_any_position() {
        let commands = vec![
            WriteCommand::new("m").with_field("a", 1.0),
            WriteCommand::new("m").with_field("a", 2.0),
            WriteCommand::default(),
        ];

        let err = validate_batch(&commands, validate_write_command).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.reason, Rejection::MissingField("measurement".into()));

        let ok = validate_batch(&commands[..2], validate_write_command).unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn test_data_entry_defaults_and_coercion() {
        let entry: DataDictionaryEntry = validate_dictionary_entry(json!({
            "category": "SAMPLE",
            "id": 42,
            "deviceUUID": "u1",
            "name": null,
            "extra": "ignored"
        }))
        .unwrap();

        assert_eq!(entry.id, "42");
        assert_eq!(entry.name, "null");
        assert_eq!(entry.item_type, "null");
    }

    #[test]
    fn test_dictionary_entry_rejections() {
        let missing = validate_dictionary_entry::<EquipmentDictionaryEntry>(json!({
            "deviceId": "d1",
            "deviceUUID": "u1"
        }));
        assert_eq!(missing, Err(Rejection::MissingField("deviceName".into())));

        let null_required = validate_dictionary_entry::<EquipmentDictionaryEntry>(json!({
            "deviceId": "d1",
            "deviceName": null,
            "deviceUUID": "u1"
        }));
        assert!(matches!(null_required, Err(Rejection::InvalidValue { .. })));

        let not_object = validate_dictionary_entry::<DataDictionaryEntry>(json!(["c", "i"]));
        assert_eq!(not_object, Err(Rejection::NotAnObject));
    }
}
