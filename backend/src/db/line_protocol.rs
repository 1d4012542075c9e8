//! InfluxDB line protocol encoding.
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp_ns]
//! ```

use std::fmt::Write;

use super::repository::{RepositoryError, RepositoryResult};
use crate::models::Point;

/// Encode one point as a single line (no trailing newline).
///
/// Tags with empty keys or values are dropped, since the store refuses them.
/// Names containing control characters are refused: line protocol has no
/// escape for a line break.
/// The timestamp, when present, is written in nanoseconds.
pub fn encode_point(point: &Point) -> RepositoryResult<String> {
    if point.fields.is_empty() {
        return Err(RepositoryError::query(format!(
            "point '{}' has no fields",
            point.measurement
        )));
    }

    let mut names = std::iter::once(point.measurement.as_str())
        .chain(point.tags.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
        .chain(point.fields.keys().map(String::as_str));
    if let Some(name) = names.find(|n| n.chars().any(char::is_control)) {
        return Err(RepositoryError::query(format!(
            "'{}' contains a control character",
            name.escape_debug()
        )));
    }

    let mut line = escape(&point.measurement, &[',', ' ']);

    for (key, value) in &point.tags {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let fields = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), value))
        .collect::<Vec<_>>()
        .join(",");
    line.push(' ');
    line.push_str(&fields);

    if let Some(time) = point.timestamp {
        let nanos = time.timestamp_nanos_opt().ok_or_else(|| {
            RepositoryError::query(format!("timestamp {} is outside the nanosecond range", time))
        })?;
        let _ = write!(line, " {}", nanos);
    }

    Ok(line)
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
