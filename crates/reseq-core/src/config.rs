//! Resequencer configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default tolerance: five seconds of lateness, in milliseconds.
pub const DEFAULT_TOLERANCE_MS: i64 = 5_000;

/// Which resequencing strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Reorder within a fixed tolerance window and emit continuously.
    #[default]
    Bounded,
    /// Buffer the whole stream and emit it sorted at end of input.
    Full,
}

impl Mode {
    /// String form used in configuration files and on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bounded" => Ok(Self::Bounded),
            "full" => Ok(Self::Full),
            _ => Err(format!("unknown mode: {s} (expected `bounded` or `full`)")),
        }
    }
}

/// How entries with identical timestamps are buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TiePolicy {
    /// Keep every entry; equal timestamps are emitted in arrival order.
    #[default]
    #[serde(rename = "preserve")]
    PreserveArrival,
    /// Legacy set semantics: a later entry replaces a buffered one with the
    /// same timestamp. Loses data and exists only to reproduce old reports.
    #[serde(rename = "collapse")]
    CollapseEqual,
}

/// What the bounded mode does with entries still buffered at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailPolicy {
    /// Discard the tail. Keeps the latency bound meaningful for live streams.
    #[default]
    Drop,
    /// Emit the tail in ascending order.
    Flush,
}

/// Configuration shared by both resequencing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResequencerConfig {
    /// Which strategy to run.
    pub mode: Mode,

    /// Minimum lag behind the high-water mark, in timestamp units, before a
    /// buffered entry is released. Ignored by [`Mode::Full`].
    pub tolerance_ms: i64,

    /// Handling of equal timestamps.
    pub ties: TiePolicy,

    /// Handling of the bounded-mode tail at end of input.
    pub tail: TailPolicy,
}

impl Default for ResequencerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            tolerance_ms: DEFAULT_TOLERANCE_MS,
            ties: TiePolicy::default(),
            tail: TailPolicy::default(),
        }
    }
}

impl ResequencerConfig {
    /// Bounded configuration with the given tolerance and default policies.
    pub fn bounded(tolerance_ms: i64) -> Self {
        Self {
            mode: Mode::Bounded,
            tolerance_ms,
            ..Self::default()
        }
    }

    /// Full-buffering configuration with default policies.
    pub fn full() -> Self {
        Self {
            mode: Mode::Full,
            ..Self::default()
        }
    }

    /// Sets the tie policy.
    #[must_use]
    pub const fn with_ties(mut self, ties: TiePolicy) -> Self {
        self.ties = ties;
        self
    }

    /// Sets the tail policy.
    #[must_use]
    pub const fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    /// Rejects configurations the engine cannot run.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance_ms < 0 {
            return Err(ConfigError::NegativeTolerance(self.tolerance_ms));
        }
        Ok(())
    }
}
