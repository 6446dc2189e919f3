//! Error types for the resequencing engine.

use thiserror::Error;

/// Failure to derive a timestamp from an event.
///
/// Extraction failures are fatal for the event that caused them: the engine
/// never substitutes a default timestamp, since a guessed value would silently
/// corrupt every ordering guarantee downstream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The timestamp field is absent from the event.
    #[error("missing timestamp field `{field}`")]
    MissingField { field: String },

    /// The field exists but holds a JSON type that cannot be a timestamp.
    #[error("timestamp field `{field}` has unsupported type {found}")]
    UnsupportedType { field: String, found: &'static str },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp `{value}` in field `{field}`: {reason}")]
    Unparseable {
        field: String,
        value: String,
        reason: String,
    },

    /// A numeric timestamp does not fit the engine's signed millisecond range.
    #[error("timestamp `{value}` in field `{field}` is out of range")]
    OutOfRange { field: String, value: String },

    /// Failure reported by a caller-supplied extractor.
    #[error("{0}")]
    Custom(String),
}

impl ExtractionError {
    /// Creates an error from a free-form message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Invalid resequencer configuration, rejected at construction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Tolerance must be zero or positive.
    #[error("tolerance must be non-negative, got {0}")]
    NegativeTolerance(i64),
}

/// Errors surfaced by resequencer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResequenceError {
    /// The timestamp extractor rejected the current event.
    #[error("timestamp extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The resequencer was configured with invalid parameters.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An event was pushed after end-of-input without an intervening reset.
    #[error("resequencer already reached end of input")]
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_error_messages() {
        let err = ExtractionError::MissingField {
            field: "ts".into(),
        };
        assert_eq!(err.to_string(), "missing timestamp field `ts`");

        let err = ExtractionError::Unparseable {
            field: "time".into(),
            value: "yesterday".into(),
            reason: "input contains invalid characters".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid timestamp `yesterday` in field `time`: input contains invalid characters"
        );
    }

    #[test]
    fn resequence_error_wraps_sources() {
        let err: ResequenceError = ConfigError::NegativeTolerance(-3).into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: tolerance must be non-negative, got -3"
        );

        let err: ResequenceError = ExtractionError::custom("bad hub record").into();
        assert_eq!(err.to_string(), "timestamp extraction failed: bad hub record");
    }
}
