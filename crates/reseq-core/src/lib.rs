//! Timestamp resequencing for near-sorted event streams.
//!
//! Smart-home sensor hubs deliver door, motion and power events slightly out
//! of order. This crate repairs such streams:
//! - [`BoundedResequencer`]: online, reorders within a fixed tolerance window
//!   and emits continuously with bounded memory
//! - [`FullResequencer`]: offline, buffers a finite stream and emits it fully
//!   sorted at end of input
//!
//! Both are built on [`OrderedBuffer`] and learn event times through a
//! [`TimestampExtractor`]. Events are never inspected or modified otherwise.

mod bounded;
mod buffer;
mod config;
mod entry;
mod error;
pub mod extract;
mod full;
mod resequencer;

pub use bounded::BoundedResequencer;
pub use buffer::{Drain, OrderedBuffer};
pub use config::{DEFAULT_TOLERANCE_MS, Mode, ResequencerConfig, TailPolicy, TiePolicy};
pub use entry::TimedEntry;
pub use error::{ConfigError, ExtractionError, ResequenceError};
pub use extract::{JsonTimestamp, TimestampExtractor, TimestampUnit};
pub use full::FullResequencer;
pub use resequencer::{AnyResequencer, Resequencer, ResequencerStats, resequence_all};
