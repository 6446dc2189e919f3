//! Timestamp extraction.
//!
//! The engine treats events as opaque. It learns where an event sits in time
//! from a [`TimestampExtractor`], evaluated exactly once per event on arrival.
//! Extractors must be pure: the same event always yields the same timestamp.
//!
//! Any `Fn(&E) -> Result<i64, ExtractionError>` is an extractor. For JSON
//! sensor logs, [`JsonTimestamp`] reads a field and converts it to epoch
//! milliseconds.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ExtractionError;

/// Derives a signed integer timestamp from an event.
pub trait TimestampExtractor<E> {
    /// Returns the event's timestamp.
    fn extract(&self, event: &E) -> Result<i64, ExtractionError>;
}

impl<E, F> TimestampExtractor<E> for F
where
    F: Fn(&E) -> Result<i64, ExtractionError>,
{
    fn extract(&self, event: &E) -> Result<i64, ExtractionError> {
        self(event)
    }
}

/// How a JSON timestamp field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    /// Numbers are epoch milliseconds; strings are RFC 3339, or integer
    /// milliseconds if they are all digits.
    #[default]
    Auto,
    /// Epoch milliseconds.
    Millis,
    /// Epoch seconds, fractional values allowed.
    Seconds,
    /// RFC 3339 / ISO 8601 strings such as `2024-03-01T08:15:00Z`.
    Rfc3339,
}

impl TimestampUnit {
    /// String form used in configuration files and on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Millis => "millis",
            Self::Seconds => "seconds",
            Self::Rfc3339 => "rfc3339",
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimestampUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "millis" | "ms" => Ok(Self::Millis),
            "seconds" | "s" => Ok(Self::Seconds),
            "rfc3339" | "iso8601" => Ok(Self::Rfc3339),
            _ => Err(format!("unknown timestamp unit: {s}")),
        }
    }
}

/// Extracts epoch milliseconds from a field of a JSON event.
///
/// The field is addressed either by a JSON pointer (`/reading/at`) or by a
/// dotted path (`reading.at`). A bare name such as `timestamp` is a one-segment
/// dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTimestamp {
    field: String,
    unit: TimestampUnit,
}

impl JsonTimestamp {
    /// Creates an extractor for `field` interpreted as `unit`.
    pub fn new(field: impl Into<String>, unit: TimestampUnit) -> Self {
        Self {
            field: field.into(),
            unit,
        }
    }

    /// Returns the configured field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the configured unit.
    pub const fn unit(&self) -> TimestampUnit {
        self.unit
    }

    fn lookup<'a>(&self, event: &'a Value) -> Option<&'a Value> {
        if self.field.starts_with('/') {
            return event.pointer(&self.field);
        }
        self.field
            .split('.')
            .try_fold(event, |value, segment| value.get(segment))
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_lossless
    )]
    fn from_number(&self, n: &Number, scale: i64) -> Result<i64, ExtractionError> {
        let out_of_range = || ExtractionError::OutOfRange {
            field: self.field.clone(),
            value: n.to_string(),
        };
        if let Some(i) = n.as_i64() {
            return i.checked_mul(scale).ok_or_else(out_of_range);
        }
        if n.is_u64() {
            return Err(out_of_range());
        }
        let scaled = n.as_f64().map(|f| f * scale as f64).ok_or_else(out_of_range)?;
        if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
            Ok(scaled.round() as i64)
        } else {
            Err(out_of_range())
        }
    }

    fn from_integer_str(&self, s: &str, scale: i64) -> Result<i64, ExtractionError> {
        let parsed: i64 = s.trim().parse().map_err(|err: std::num::ParseIntError| {
            ExtractionError::Unparseable {
                field: self.field.clone(),
                value: s.to_string(),
                reason: err.to_string(),
            }
        })?;
        parsed
            .checked_mul(scale)
            .ok_or_else(|| ExtractionError::OutOfRange {
                field: self.field.clone(),
                value: s.to_string(),
            })
    }

    fn from_rfc3339(&self, s: &str) -> Result<i64, ExtractionError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.timestamp_millis())
            .map_err(|err| ExtractionError::Unparseable {
                field: self.field.clone(),
                value: s.to_string(),
                reason: err.to_string(),
            })
    }

    fn unsupported(&self, value: &Value) -> ExtractionError {
        ExtractionError::UnsupportedType {
            field: self.field.clone(),
            found: json_type_name(value),
        }
    }
}

impl Default for JsonTimestamp {
    fn default() -> Self {
        Self::new("timestamp", TimestampUnit::Auto)
    }
}

impl TimestampExtractor<Value> for JsonTimestamp {
    fn extract(&self, event: &Value) -> Result<i64, ExtractionError> {
        let value = self
            .lookup(event)
            .ok_or_else(|| ExtractionError::MissingField {
                field: self.field.clone(),
            })?;

        match (self.unit, value) {
            (TimestampUnit::Auto | TimestampUnit::Millis, Value::Number(n)) => {
                self.from_number(n, 1)
            }
            (TimestampUnit::Seconds, Value::Number(n)) => self.from_number(n, 1_000),
            (TimestampUnit::Millis, Value::String(s)) => self.from_integer_str(s, 1),
            (TimestampUnit::Seconds, Value::String(s)) => self.from_integer_str(s, 1_000),
            (TimestampUnit::Rfc3339, Value::String(s)) => self.from_rfc3339(s),
            (TimestampUnit::Auto, Value::String(s)) => {
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    self.from_integer_str(s, 1)
                } else {
                    self.from_rfc3339(s)
                }
            }
            (_, other) => Err(self.unsupported(other)),
        }
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn closures_are_extractors() {
        let extractor =
            |event: &(i64, String)| -> Result<i64, ExtractionError> { Ok(event.0) };
        assert_eq!(extractor.extract(&(42, "door".to_string())), Ok(42));
    }

    #[test]
    fn reads_integer_millis_by_default() {
        let extractor = JsonTimestamp::default();
        let event = json!({"timestamp": 1_709_280_900_000_i64, "sensor": "M001"});
        assert_eq!(extractor.extract(&event), Ok(1_709_280_900_000));
    }

    #[test]
    fn auto_parses_rfc3339_and_digit_strings() {
        let extractor = JsonTimestamp::default();
        let iso = json!({"timestamp": "1970-01-01T00:00:01.500Z"});
        assert_eq!(extractor.extract(&iso), Ok(1_500));

        let offset = json!({"timestamp": "1970-01-01T01:00:00+01:00"});
        assert_eq!(extractor.extract(&offset), Ok(0));

        let digits = json!({"timestamp": "250"});
        assert_eq!(extractor.extract(&digits), Ok(250));
    }

    #[test]
    fn seconds_scale_to_millis() {
        let extractor = JsonTimestamp::new("t", TimestampUnit::Seconds);
        assert_eq!(extractor.extract(&json!({"t": 12})), Ok(12_000));
        assert_eq!(extractor.extract(&json!({"t": 1.25})), Ok(1_250));
        assert_eq!(extractor.extract(&json!({"t": "3"})), Ok(3_000));
    }

    #[test]
    fn dotted_paths_and_pointers_reach_nested_fields() {
        let event = json!({"reading": {"at": 77}, "tags": [{"at": 5}]});
        let dotted = JsonTimestamp::new("reading.at", TimestampUnit::Millis);
        assert_eq!(dotted.extract(&event), Ok(77));

        let pointer = JsonTimestamp::new("/tags/0/at", TimestampUnit::Millis);
        assert_eq!(pointer.extract(&event), Ok(5));
    }

    #[test]
    fn missing_field_is_an_error() {
        let extractor = JsonTimestamp::default();
        let err = extractor.extract(&json!({"time": 1})).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingField {
                field: "timestamp".into()
            }
        );
    }

    #[test]
    fn rejects_wrong_types_and_bad_strings() {
        let extractor = JsonTimestamp::new("timestamp", TimestampUnit::Rfc3339);
        let err = extractor.extract(&json!({"timestamp": 5})).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::UnsupportedType {
                field: "timestamp".into(),
                found: "number"
            }
        );

        let err = extractor
            .extract(&json!({"timestamp": "last tuesday"}))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unparseable { .. }));

        let auto = JsonTimestamp::default();
        let err = auto.extract(&json!({"timestamp": null})).unwrap_err();
        assert!(err.to_string().contains("unsupported type null"));
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let extractor = JsonTimestamp::new("t", TimestampUnit::Seconds);
        let err = extractor.extract(&json!({"t": i64::MAX})).unwrap_err();
        assert!(matches!(err, ExtractionError::OutOfRange { .. }));

        let millis = JsonTimestamp::new("t", TimestampUnit::Millis);
        let err = millis.extract(&json!({"t": u64::MAX})).unwrap_err();
        assert!(matches!(err, ExtractionError::OutOfRange { .. }));
    }

    #[test]
    fn unit_parses_aliases() {
        assert_eq!("ms".parse::<TimestampUnit>(), Ok(TimestampUnit::Millis));
        assert_eq!("iso8601".parse::<TimestampUnit>(), Ok(TimestampUnit::Rfc3339));
        assert!("fortnights".parse::<TimestampUnit>().is_err());
    }
}
