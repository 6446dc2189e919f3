//! Online resequencing within a fixed lateness tolerance.
//!
//! # Release rule
//!
//! After every accepted event the high-water mark `H` (largest timestamp seen)
//! is updated, then buffered entries are released from the front of the
//! buffer while `H - timestamp >= tolerance`. The loop stops at the first
//! entry that is not old enough; since the buffer is ordered, no later entry
//! can be either.
//!
//! An event that arrives more than `tolerance` behind `H` is released on the
//! spot, after entries already emitted with larger timestamps. Such events are
//! counted in [`ResequencerStats::late`].
//!
//! # End of input
//!
//! With [`TailPolicy::Drop`] the entries still buffered (at most
//! `tolerance`-worth behind the final high-water mark) are discarded. This
//! keeps the latency bound honest for live streams. [`TailPolicy::Flush`]
//! emits them instead.

use crate::config::{Mode, ResequencerConfig, TailPolicy, TiePolicy};
use crate::error::{ConfigError, ResequenceError};
use crate::extract::TimestampExtractor;
use crate::resequencer::{Engine, Resequencer, ResequencerStats};

/// Resequences a near-sorted stream with bounded buffering and latency.
#[derive(Debug)]
pub struct BoundedResequencer<E, X> {
    engine: Engine<E, X>,
    tolerance: i64,
    tail: TailPolicy,
}

impl<E, X: TimestampExtractor<E>> BoundedResequencer<E, X> {
    /// Creates a resequencer with the given tolerance and default policies.
    pub fn new(extractor: X, tolerance: i64) -> Result<Self, ConfigError> {
        Self::with_config(extractor, &ResequencerConfig::bounded(tolerance))
    }

    /// Creates a resequencer from the tolerance, tie and tail settings of
    /// `config`. The mode field is ignored.
    pub fn with_config(extractor: X, config: &ResequencerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: Engine::new(extractor, config.ties),
            tolerance: config.tolerance_ms,
            tail: config.tail,
        })
    }

    /// The configured tolerance.
    pub const fn tolerance(&self) -> i64 {
        self.tolerance
    }

    /// What happens to the buffered tail at end of input.
    pub const fn tail_policy(&self) -> TailPolicy {
        self.tail
    }

    /// How equal timestamps are buffered.
    pub const fn tie_policy(&self) -> TiePolicy {
        self.engine.buffer.tie_policy()
    }

    /// The settings this resequencer runs with.
    pub const fn config(&self) -> ResequencerConfig {
        ResequencerConfig {
            mode: Mode::Bounded,
            tolerance_ms: self.tolerance,
            ties: self.tie_policy(),
            tail: self.tail,
        }
    }

    /// Returns `true` once end of input has been signalled.
    pub const fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    /// Timestamp of the oldest buffered entry.
    pub fn oldest_buffered(&self) -> Option<i64> {
        self.engine.oldest_buffered()
    }

    fn is_ripe(&self, high_water: i64, timestamp: i64) -> bool {
        i128::from(high_water) - i128::from(timestamp) >= i128::from(self.tolerance)
    }
}

impl<E, X: TimestampExtractor<E>> Resequencer<E> for BoundedResequencer<E, X> {
    fn on_event<F: FnMut(E)>(&mut self, event: E, mut emit: F) -> Result<(), ResequenceError> {
        let high_water = self.engine.accept(event)?;

        while let Some(oldest) = self.engine.buffer.min_timestamp() {
            if !self.is_ripe(high_water, oldest) {
                break;
            }
            let Some(entry) = self.engine.buffer.remove_min() else {
                break;
            };
            self.engine.emit(entry, &mut emit);
        }
        Ok(())
    }

    fn on_end_of_input<F: FnMut(E)>(&mut self, mut emit: F) {
        if !self.engine.finish() {
            return;
        }
        match self.tail {
            TailPolicy::Drop => self.engine.discard(),
            TailPolicy::Flush => self.engine.flush(&mut emit),
        }
        self.engine.log_summary(Mode::Bounded);
    }

    fn reset(&mut self) {
        self.engine.reset();
    }

    fn stats(&self) -> ResequencerStats {
        self.engine.stats
    }

    fn high_water(&self) -> Option<i64> {
        self.engine.high_water()
    }

    fn len(&self) -> usize {
        self.engine.buffer.len()
    }
}
