//! Sequence ID generation for request/response correlation
//!
//! A single [`SequenceGenerator`] is shared (usually behind an `Arc`) by every
//! call site that builds headers for one process. IDs start at 0 and wrap
//! silently at `u32::MAX`; correlation only needs uniqueness within the
//! in-flight window of a connection.

use std::sync::atomic::{AtomicU32, Ordering};

/// Atomic 32-bit sequence counter
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU32,
}

impl SequenceGenerator {
    /// Counter starting at 0
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Counter whose first issued ID is `first`
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Issue the next ID
    ///
    /// `fetch_add` wraps on overflow, so `u32::MAX` is followed by 0.
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// ID the next call to [`next_id`](Self::next_id) will return
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_at_zero() {
        let seq = SequenceGenerator::new();
        assert_eq!(seq.next_id(), 0);
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.peek(), 2);
    }

    #[test]
    fn test_wraps_silently() {
        let seq = SequenceGenerator::starting_at(u32::MAX - 1);
        assert_eq!(seq.next_id(), u32::MAX - 1);
        assert_eq!(seq.next_id(), u32::MAX);
        assert_eq!(seq.next_id(), 0);
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let seq = Arc::new(SequenceGenerator::new());
        let threads = 8;
        let per_thread = 10_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || (0..per_thread).map(|_| seq.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate sequence id {}", id);
            }
        }
        assert_eq!(seen.len(), threads * per_thread);
        assert_eq!(seq.peek() as usize, threads * per_thread);
    }
}
