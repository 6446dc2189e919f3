//! Offline resequencing of a finite stream.

use crate::config::{Mode, TiePolicy};
use crate::error::ResequenceError;
use crate::extract::TimestampExtractor;
use crate::resequencer::{Engine, Resequencer, ResequencerStats};

/// Buffers every event and emits the whole stream sorted at end of input.
///
/// Memory grows with the input; use it for logs that were already captured.
#[derive(Debug)]
pub struct FullResequencer<E, X> {
    engine: Engine<E, X>,
}

impl<E, X: TimestampExtractor<E>> FullResequencer<E, X> {
    /// Creates a resequencer that keeps every entry, including ties.
    pub fn new(extractor: X) -> Self {
        Self::with_ties(extractor, TiePolicy::default())
    }

    /// Creates a resequencer with an explicit tie policy.
    pub fn with_ties(extractor: X, ties: TiePolicy) -> Self {
        Self {
            engine: Engine::new(extractor, ties),
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
}

impl<E, X: TimestampExtractor<E>> Resequencer<E> for FullResequencer<E, X> {
    fn on_event<F: FnMut(E)>(&mut self, event: E, _emit: F) -> Result<(), ResequenceError> {
        self.engine.accept(event).map(|_| ())
    }

    fn on_end_of_input<F: FnMut(E)>(&mut self, mut emit: F) {
        if !self.engine.finish() {
            return;
        }
        self.engine.flush(&mut emit);
        self.engine.log_summary(Mode::Full);
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

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ExtractionError;

    type Reading = (i64, char);

    fn ts(event: &Reading) -> Result<i64, ExtractionError> {
        Ok(event.0)
    }

    #[test]
    fn emits_nothing_before_end_of_input() {
        let mut r: FullResequencer<Reading, _> = FullResequencer::new(ts);
        let mut out: Vec<Reading> = Vec::new();
        for event in [(30, 'c'), (10, 'a'), (20, 'b')] {
            r.on_event(event, |e| out.push(e)).unwrap();
        }
        assert!(out.is_empty());
        assert_eq!(r.len(), 3);
        assert_eq!(r.high_water(), Some(30));

        r.on_end_of_input(|e| out.push(e));
        assert_eq!(out, vec![(10, 'a'), (20, 'b'), (30, 'c')]);
        assert!(r.is_empty());
        assert!(r.is_finished());
    }

    #[test]
    fn second_end_of_input_is_a_no_op() {
        let mut r: FullResequencer<Reading, _> = FullResequencer::new(ts);
        r.on_event((1, 'a'), |_| {}).unwrap();

        let mut count = 0;
        r.on_end_of_input(|_| count += 1);
        r.on_end_of_input(|_| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn no_input_after_end() {
        let mut r: FullResequencer<Reading, _> = FullResequencer::new(ts);
        r.on_end_of_input(|_| {});
        assert_eq!(
            r.on_event((1, 'a'), |_| {}).err(),
            Some(ResequenceError::Finished)
        );
    }

    #[test]
    fn collapse_policy_keeps_only_last_tie() {
        let mut r: FullResequencer<Reading, _> =
            FullResequencer::with_ties(ts, TiePolicy::CollapseEqual);
        let mut out: Vec<Reading> = Vec::new();
        r.on_event((5, 'A'), |_| {}).unwrap();
        r.on_event((5, 'B'), |_| {}).unwrap();
        r.on_end_of_input(|e| out.push(e));

        assert_eq!(out, vec![(5, 'B')]);
        assert_eq!(r.stats().replaced, 1);
    }
}
