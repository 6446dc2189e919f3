//! Push-model interface shared by both resequencing modes.

use serde::{Deserialize, Serialize};

use crate::bounded::BoundedResequencer;
use crate::buffer::OrderedBuffer;
use crate::config::{Mode, ResequencerConfig, TiePolicy};
use crate::entry::TimedEntry;
use crate::error::ResequenceError;
use crate::extract::TimestampExtractor;
use crate::full::FullResequencer;

/// A stage that accepts events in arrival order and emits them in timestamp
/// order.
///
/// Emission is synchronous: every event released by a call is handed to the
/// `emit` sink before the call returns.
pub trait Resequencer<E> {
    /// Accepts one event, emitting zero or more events that became releasable.
    ///
    /// On error the event is discarded and the resequencer state is unchanged.
    fn on_event<F: FnMut(E)>(&mut self, event: E, emit: F) -> Result<(), ResequenceError>;

    /// Signals that no more input will arrive.
    ///
    /// Further calls to [`Resequencer::on_event`] fail with
    /// [`ResequenceError::Finished`] until [`Resequencer::reset`]. Calling
    /// this again is a no-op.
    fn on_end_of_input<F: FnMut(E)>(&mut self, emit: F);

    /// Discards buffered entries without emitting them and returns to the
    /// initial state.
    fn reset(&mut self);

    /// Counters accumulated since construction or the last reset.
    fn stats(&self) -> ResequencerStats;

    /// The highest timestamp observed so far, if any event was accepted.
    fn high_water(&self) -> Option<i64>;

    /// Number of buffered entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters describing what a resequencer has done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResequencerStats {
    /// Events accepted.
    pub received: u64,
    /// Events emitted downstream.
    pub emitted: u64,
    /// Events discarded at end of input.
    pub dropped: u64,
    /// Events displaced by a later event with the same timestamp.
    pub replaced: u64,
    /// Events that arrived with a timestamp below one already emitted.
    pub late: u64,
    /// Largest number of entries buffered at once.
    pub peak_buffered: usize,
}

/// Buffer, extractor and bookkeeping common to both modes.
#[derive(Debug)]
pub(crate) struct Engine<E, X> {
    pub(crate) buffer: OrderedBuffer<E>,
    extractor: X,
    high_water: Option<i64>,
    last_emitted: Option<i64>,
    pub(crate) stats: ResequencerStats,
    finished: bool,
}

impl<E, X: TimestampExtractor<E>> Engine<E, X> {
    pub(crate) fn new(extractor: X, ties: TiePolicy) -> Self {
        Self {
            buffer: OrderedBuffer::new(ties),
            extractor,
            high_water: None,
            last_emitted: None,
            stats: ResequencerStats::default(),
            finished: false,
        }
    }

    /// Extracts the timestamp and buffers the event, returning the new
    /// high-water mark.
    pub(crate) fn accept(&mut self, event: E) -> Result<i64, ResequenceError> {
        if self.finished {
            return Err(ResequenceError::Finished);
        }
        let timestamp = self.extractor.extract(&event)?;

        if let Some(last) = self.last_emitted.filter(|&last| timestamp < last) {
            self.stats.late += 1;
            tracing::warn!(timestamp, last_emitted = last, "event arrived behind emitted output");
        }

        if self.buffer.insert(timestamp, event).is_some() {
            self.stats.replaced += 1;
            tracing::warn!(timestamp, "replaced buffered entry with equal timestamp");
        }
        self.stats.received += 1;
        self.stats.peak_buffered = self.stats.peak_buffered.max(self.buffer.len());

        let high_water = self.high_water.map_or(timestamp, |hw| hw.max(timestamp));
        self.high_water = Some(high_water);
        Ok(high_water)
    }

    pub(crate) fn emit<F: FnMut(E)>(&mut self, entry: TimedEntry<E>, emit: &mut F) {
        let timestamp = entry.timestamp();
        tracing::trace!(timestamp, "releasing entry");
        self.last_emitted = Some(timestamp);
        self.stats.emitted += 1;
        emit(entry.into_payload());
    }

    /// Emits every buffered entry in ascending order.
    pub(crate) fn flush<F: FnMut(E)>(&mut self, emit: &mut F) {
        while let Some(entry) = self.buffer.remove_min() {
            self.emit(entry, emit);
        }
    }

    /// Discards every buffered entry, counting them as dropped.
    pub(crate) fn discard(&mut self) {
        let dropped = self.buffer.len() as u64;
        self.buffer.clear();
        self.stats.dropped += dropped;
    }

    /// Marks the end of input. Returns `false` if it was already marked.
    pub(crate) fn finish(&mut self) -> bool {
        !std::mem::replace(&mut self.finished, true)
    }

    pub(crate) fn log_summary(&self, mode: Mode) {
        let stats = &self.stats;
        if stats.late > 0 || stats.replaced > 0 || stats.dropped > 0 {
            tracing::warn!(
                %mode,
                received = stats.received,
                emitted = stats.emitted,
                dropped = stats.dropped,
                replaced = stats.replaced,
                late = stats.late,
                "end of input with lossy or out-of-order output"
            );
        } else {
            tracing::debug!(
                %mode,
                received = stats.received,
                emitted = stats.emitted,
                peak_buffered = stats.peak_buffered,
                "end of input"
            );
        }
    }

    pub(crate) fn reset(&mut self) {
        tracing::debug!(discarded = self.buffer.len(), "resetting resequencer");
        self.buffer.clear();
        self.high_water = None;
        self.last_emitted = None;
        self.stats = ResequencerStats::default();
        self.finished = false;
    }

    pub(crate) fn oldest_buffered(&self) -> Option<i64> {
        self.buffer.min_timestamp()
    }

    pub(crate) const fn high_water(&self) -> Option<i64> {
        self.high_water
    }

    pub(crate) const fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Either resequencing mode, chosen at runtime from a [`ResequencerConfig`].
#[derive(Debug)]
pub enum AnyResequencer<E, X> {
    Bounded(BoundedResequencer<E, X>),
    Full(FullResequencer<E, X>),
}

impl<E, X: TimestampExtractor<E>> AnyResequencer<E, X> {
    /// Builds the resequencer described by `config`.
    pub fn from_config(extractor: X, config: &ResequencerConfig) -> Result<Self, ResequenceError> {
        config.validate()?;
        Ok(match config.mode {
            Mode::Bounded => Self::Bounded(BoundedResequencer::with_config(extractor, config)?),
            Mode::Full => Self::Full(FullResequencer::with_ties(extractor, config.ties)),
        })
    }

    /// The mode this resequencer runs in.
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Bounded(_) => Mode::Bounded,
            Self::Full(_) => Mode::Full,
        }
    }
}

impl<E, X: TimestampExtractor<E>> Resequencer<E> for AnyResequencer<E, X> {
    fn on_event<F: FnMut(E)>(&mut self, event: E, emit: F) -> Result<(), ResequenceError> {
        match self {
            Self::Bounded(r) => r.on_event(event, emit),
            Self::Full(r) => r.on_event(event, emit),
        }
    }

    fn on_end_of_input<F: FnMut(E)>(&mut self, emit: F) {
        match self {
            Self::Bounded(r) => r.on_end_of_input(emit),
            Self::Full(r) => r.on_end_of_input(emit),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Bounded(r) => r.reset(),
            Self::Full(r) => r.reset(),
        }
    }

    fn stats(&self) -> ResequencerStats {
        match self {
            Self::Bounded(r) => r.stats(),
            Self::Full(r) => r.stats(),
        }
    }

    fn high_water(&self) -> Option<i64> {
        match self {
            Self::Bounded(r) => r.high_water(),
            Self::Full(r) => r.high_water(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Bounded(r) => r.len(),
            Self::Full(r) => r.len(),
        }
    }
}

/// Feeds every event through `resequencer`, signals end of input, and
/// collects the output in emission order.
///
/// Stops at the first extraction failure.
pub fn resequence_all<E, R, I>(resequencer: &mut R, events: I) -> Result<Vec<E>, ResequenceError>
where
    R: Resequencer<E>,
    I: IntoIterator<Item = E>,
{
    let mut out = Vec::new();
    for event in events {
        resequencer.on_event(event, |e| out.push(e))?;
    }
    resequencer.on_end_of_input(|e| out.push(e));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::config::TailPolicy;
    use crate::error::ConfigError;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Runs `f` with warnings and above written to the returned buffer.
    fn capture_warnings(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.contents()
    }

    fn ts(event: &(i64, char)) -> Result<i64, crate::ExtractionError> {
        Ok(event.0)
    }

    #[test]
    fn from_config_picks_mode() {
        let bounded: AnyResequencer<(i64, char), _> =
            AnyResequencer::from_config(ts, &ResequencerConfig::bounded(10)).unwrap();
        assert_eq!(bounded.mode(), Mode::Bounded);

        let full: AnyResequencer<(i64, char), _> =
            AnyResequencer::from_config(ts, &ResequencerConfig::full()).unwrap();
        assert_eq!(full.mode(), Mode::Full);
    }

    #[test]
    fn from_config_rejects_negative_tolerance() {
        let err = AnyResequencer::<(i64, char), _>::from_config(ts, &ResequencerConfig::bounded(-5))
            .err();
        assert_eq!(
            err,
            Some(ResequenceError::Config(ConfigError::NegativeTolerance(-5)))
        );
    }

    #[test]
    fn resequence_all_runs_full_stream() {
        let config = ResequencerConfig::bounded(2).with_tail(TailPolicy::Flush);
        let mut r: AnyResequencer<(i64, char), _> =
            AnyResequencer::from_config(ts, &config).unwrap();
        let out = resequence_all(&mut r, [(3, 'c'), (1, 'a'), (2, 'b'), (9, 'z')]).unwrap();

        let labels: String = out.iter().map(|e| e.1).collect();
        assert_eq!(labels, "abcz");
        assert_eq!(r.stats().emitted, 4);
        assert_eq!(r.stats().dropped, 0);
    }

    #[test]
    fn stats_track_late_arrivals() {
        let mut r: AnyResequencer<(i64, char), _> =
            AnyResequencer::from_config(ts, &ResequencerConfig::bounded(0)).unwrap();
        let out = resequence_all(&mut r, [(5, 'a'), (3, 'b')]).unwrap();

        assert_eq!(out, vec![(5, 'a'), (3, 'b')]);
        assert_eq!(r.stats().late, 1);
    }

    #[test]
    fn late_arrivals_and_collapsed_ties_are_warned_about() {
        let logs = capture_warnings(|| {
            let config = ResequencerConfig::bounded(0).with_ties(TiePolicy::CollapseEqual);
            let mut r: AnyResequencer<(i64, char), _> =
                AnyResequencer::from_config(ts, &config).unwrap();
            r.on_event((5, 'a'), |_| {}).unwrap();
            r.on_event((3, 'b'), |_| {}).unwrap();

            let mut full: AnyResequencer<(i64, char), _> = AnyResequencer::from_config(
                ts,
                &ResequencerConfig::full().with_ties(TiePolicy::CollapseEqual),
            )
            .unwrap();
            full.on_event((7, 'x'), |_| {}).unwrap();
            full.on_event((7, 'y'), |_| {}).unwrap();
        });

        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("event arrived behind emitted output"), "{logs}");
        assert!(logs.contains("replaced buffered entry with equal timestamp"), "{logs}");
    }

    #[test]
    fn in_order_input_logs_no_warnings() {
        let logs = capture_warnings(|| {
            let mut r: AnyResequencer<(i64, char), _> =
                AnyResequencer::from_config(ts, &ResequencerConfig::bounded(1)).unwrap();
            resequence_all(&mut r, [(1, 'a'), (2, 'b'), (3, 'c')]).unwrap();
        });
        // The dropped tail is reported once, by the end-of-input summary.
        assert!(!logs.contains("arrived behind"), "{logs}");
        assert!(!logs.contains("replaced buffered entry"), "{logs}");
    }
}
