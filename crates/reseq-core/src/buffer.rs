//! Timestamp-ordered buffer shared by both resequencing modes.

use std::collections::BTreeSet;
use std::iter::FusedIterator;

use crate::config::TiePolicy;
use crate::entry::TimedEntry;

/// A collection of [`TimedEntry`] values that is always iterable in ascending
/// timestamp order.
///
/// Insertion and removal of the minimum are logarithmic; the minimum
/// timestamp is cached and read in constant time. The buffer assigns arrival
/// sequences itself, so callers only supply a timestamp and a payload.
#[derive(Debug)]
pub struct OrderedBuffer<E> {
    entries: BTreeSet<TimedEntry<E>>,
    ties: TiePolicy,
    next_sequence: u64,
    min_timestamp: Option<i64>,
}

impl<E> Default for OrderedBuffer<E> {
    fn default() -> Self {
        Self::new(TiePolicy::default())
    }
}

impl<E> OrderedBuffer<E> {
    /// Creates an empty buffer with the given tie policy.
    pub const fn new(ties: TiePolicy) -> Self {
        Self {
            entries: BTreeSet::new(),
            ties,
            next_sequence: 0,
            min_timestamp: None,
        }
    }

    /// Returns the tie policy this buffer was created with.
    pub const fn tie_policy(&self) -> TiePolicy {
        self.ties
    }

    /// Inserts an event under `timestamp`.
    ///
    /// Returns the payload that was displaced, which can only happen under
    /// [`TiePolicy::CollapseEqual`] when an entry with the same timestamp is
    /// already buffered.
    pub fn insert(&mut self, timestamp: i64, payload: E) -> Option<E> {
        let sequence = match self.ties {
            TiePolicy::PreserveArrival => {
                let seq = self.next_sequence;
                self.next_sequence += 1;
                seq
            }
            TiePolicy::CollapseEqual => 0,
        };
        self.min_timestamp = Some(
            self.min_timestamp
                .map_or(timestamp, |min| min.min(timestamp)),
        );
        self.entries
            .replace(TimedEntry::new(timestamp, sequence, payload))
            .map(TimedEntry::into_payload)
    }

    /// Timestamp of the entry with the smallest key, in constant time.
    pub const fn min_timestamp(&self) -> Option<i64> {
        self.min_timestamp
    }

    /// Returns the entry with the smallest key, if any.
    pub fn peek_min(&self) -> Option<&TimedEntry<E>> {
        self.entries.first()
    }

    /// Removes and returns the entry with the smallest key, if any.
    pub fn remove_min(&mut self) -> Option<TimedEntry<E>> {
        let entry = self.entries.pop_first()?;
        self.min_timestamp = self.entries.first().map(TimedEntry::timestamp);
        Some(entry)
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates buffered entries in ascending order without removing them.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TimedEntry<E>> {
        self.entries.iter()
    }

    /// Returns a lazy iterator that removes entries in ascending order as it
    /// is consumed.
    ///
    /// Entries not consumed before the iterator is dropped stay buffered.
    pub fn drain_ascending(&mut self) -> Drain<'_, E> {
        Drain { buffer: self }
    }

    /// Discards every buffered entry and restarts arrival numbering.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_sequence = 0;
        self.min_timestamp = None;
    }
}

/// Iterator returned by [`OrderedBuffer::drain_ascending`].
#[derive(Debug)]
pub struct Drain<'a, E> {
    buffer: &'a mut OrderedBuffer<E>,
}

impl<E> Iterator for Drain<'_, E> {
    type Item = TimedEntry<E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.remove_min()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.buffer.len();
        (len, Some(len))
    }
}

impl<E> ExactSizeIterator for Drain<'_, E> {}

impl<E> FusedIterator for Drain<'_, E> {}
