//! Per-connection outbound sequence numbering.
//!
//! Every frame a controller session writes carries the next value of its
//! [`SequenceCounter`], so a control surface can spot dropped or replayed
//! feedback.  The counter is lock-free: the reply path and the feedback
//! forwarding path of a session both draw from it concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::codec::{encode_message_now, ProtocolError};
use crate::protocol::messages::WallMessage;

/// A thread-safe, monotonically increasing counter for frame sequence numbers.
///
/// Starts at 0 and wraps from `u64::MAX` back to 0 without panicking.
///
/// ```rust
/// use videowall_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number and advances the counter.
    pub fn next(&self) -> u64 {
        // Relaxed: the value only orders frames, it does not publish memory.
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`next`](Self::next) will hand out.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Encodes `msg` with the next sequence number and the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the message cannot be encoded.  The
    /// sequence number is consumed either way.
    pub fn encode(&self, msg: &WallMessage) -> Result<Vec<u8>, ProtocolError> {
        encode_message_now(msg, self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::decode_message;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_starts_at_zero_and_increments() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_sequence_counter_wraps_at_u64_max() {
        let counter = SequenceCounter {
            inner: AtomicU64::new(u64::MAX),
        };
        assert_eq!(counter.next(), u64::MAX);
        assert_eq!(counter.next(), 0, "counter must wrap to 0 after u64::MAX");
    }

    #[test]
    fn test_sequence_counter_is_unique_across_threads() {
        let counter = Arc::new(SequenceCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..500).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 2000, "every sequence number must be unique");
    }

    #[test]
    fn test_encode_stamps_successive_sequence_numbers() {
        let counter = SequenceCounter::new();
        let first = counter.encode(&WallMessage::Pong(1)).unwrap();
        let second = counter.encode(&WallMessage::Pong(2)).unwrap();

        assert_eq!(&first[8..16], &0u64.to_be_bytes());
        assert_eq!(&second[8..16], &1u64.to_be_bytes());
        assert_eq!(decode_message(&second).unwrap().0, WallMessage::Pong(2));
    }
}
