use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-local starting point for slot races.
///
/// Every `submit` starts racing at the slot returned by [`RotationCursor::advance`], so
/// bursts of requests from one process do not all pile onto slot 0 first. Not shared
/// across processes, not persisted, no correctness role.
#[derive(Debug)]
pub(crate) struct RotationCursor {
    next: AtomicUsize,
    len: usize,
}

impl RotationCursor {
    /// Creates a cursor over `len` slots (`len >= 1`, checked by config validation).
    pub(crate) fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len: len.max(1),
        }
    }

    /// Returns the current slot and moves the cursor one step, wrapping at `len`.
    ///
    /// Single atomic read-modify-write; the stored value is always `< len`.
    pub(crate) fn advance(&self) -> usize {
        let len = self.len;
        match self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| Some((cur + 1) % len))
        {
            Ok(prev) | Err(prev) => prev,
        }
    }

    #[cfg(test)]
    fn peek(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_wraps() {
        let c = RotationCursor::new(3);
        let seen: Vec<usize> = (0..7).map(|_| c.advance()).collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(c.peek(), 1);
    }

    #[test]
    fn test_single_slot_stays_zero() {
        let c = RotationCursor::new(1);
        for _ in 0..5 {
            assert_eq!(c.advance(), 0);
        }
    }

    #[test]
    fn test_concurrent_advance_stays_in_range() {
        let c = Arc::new(RotationCursor::new(4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || (0..1000).map(|_| c.advance()).collect::<Vec<_>>())
            })
            .collect();

        let mut counts = [0usize; 4];
        for h in handles {
            for slot in h.join().unwrap() {
                counts[slot] += 1;
            }
        }
        // 8000 advances over 4 slots: no lost updates means an exact split.
        assert_eq!(counts, [2000; 4]);
        assert_eq!(c.peek(), 0);
    }
}
