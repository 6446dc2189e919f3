//! Buffered events keyed by timestamp.

use std::cmp::Ordering;

/// An event paired with the timestamp extracted from it on arrival.
///
/// Entries are ordered by `(timestamp, sequence)`. The payload never takes part
/// in comparisons, so two entries with the same key are equal regardless of
/// what they carry. Under [`TiePolicy::PreserveArrival`] every entry gets a
/// distinct arrival sequence and ties fall back to arrival order; under
/// [`TiePolicy::CollapseEqual`] the sequence is always zero and entries with
/// equal timestamps are interchangeable.
///
/// [`TiePolicy::PreserveArrival`]: crate::TiePolicy::PreserveArrival
/// [`TiePolicy::CollapseEqual`]: crate::TiePolicy::CollapseEqual
#[derive(Debug, Clone)]
pub struct TimedEntry<E> {
    timestamp: i64,
    sequence: u64,
    payload: E,
}

impl<E> TimedEntry<E> {
    /// Creates an entry.
    pub const fn new(timestamp: i64, sequence: u64, payload: E) -> Self {
        Self {
            timestamp,
            sequence,
            payload,
        }
    }

    /// Returns the extracted timestamp.
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the arrival sequence used to break timestamp ties.
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns a reference to the buffered event.
    pub const fn payload(&self) -> &E {
        &self.payload
    }

    /// Consumes the entry, returning the event unmodified.
    pub fn into_payload(self) -> E {
        self.payload
    }

    fn key(&self) -> (i64, u64) {
        (self.timestamp, self.sequence)
    }
}

impl<E> PartialEq for TimedEntry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for TimedEntry<E> {}

impl<E> PartialOrd for TimedEntry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for TimedEntry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_timestamp_then_sequence() {
        let early = TimedEntry::new(5, 9, "late arrival");
        let tie_first = TimedEntry::new(7, 1, "a");
        let tie_second = TimedEntry::new(7, 2, "b");

        assert!(early < tie_first);
        assert!(tie_first < tie_second);
    }

    #[test]
    fn payload_does_not_affect_equality() {
        let a = TimedEntry::new(5, 0, "A");
        let b = TimedEntry::new(5, 0, "B");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(b.into_payload(), "B");
    }
}
