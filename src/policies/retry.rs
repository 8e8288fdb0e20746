//! # Retry policy for lock acquisition.
//!
//! [`RetryPolicy`] bounds how long a lock provider keeps trying to obtain a contended key
//! before surfacing [`LockError::Unavailable`](crate::LockError::Unavailable).
//!
//! The delay before retry `n` is `delay × factor^n`, clamped to `max`, then jitter is
//! applied. The base delay is derived purely from the retry number, so jitter output never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use slotvisor::{JitterPolicy, RetryPolicy};
//!
//! let retry = RetryPolicy {
//!     retry_count: 3,
//!     delay: Duration::from_millis(100),
//!     factor: 2.0,
//!     max: Duration::from_millis(300),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(retry.max_attempts(), 4);
//! assert_eq!(retry.next(0), Duration::from_millis(100));
//! assert_eq!(retry.next(1), Duration::from_millis(200));
//! assert_eq!(retry.next(2), Duration::from_millis(300));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Lock acquisition retry budget.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Retries after the first attempt (`0` = try exactly once).
    pub retry_count: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    /// Multiplicative growth factor (`1.0` = constant delay).
    pub factor: f64,
    /// Maximum delay cap.
    pub max: Duration,
    /// Jitter applied to every delay.
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `retry_count = 600`;
    /// - `delay = 100ms`, `factor = 1.0` (constant);
    /// - `max = 1s`;
    /// - `jitter = None`.
    ///
    /// Roughly one minute of waiting for a free slot.
    fn default() -> Self {
        Self {
            retry_count: 600,
            delay: Duration::from_millis(100),
            factor: 1.0,
            max: Duration::from_secs(1),
            jitter: JitterPolicy::None,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn once() -> Self {
        Self {
            retry_count: 0,
            ..Self::default()
        }
    }

    /// Constant-delay policy with `retry_count` retries.
    pub fn fixed(retry_count: u32, delay: Duration) -> Self {
        Self {
            retry_count,
            delay,
            factor: 1.0,
            max: delay,
            jitter: JitterPolicy::None,
        }
    }

    /// Total number of acquisition attempts (first try included).
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Computes the delay before retry number `retry` (0-indexed).
    pub fn next(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.delay.as_secs_f64() * self.factor.powi(exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_constant() {
        let policy = RetryPolicy::default();
        for retry in 0..10 {
            assert_eq!(policy.next(retry), Duration::from_millis(100));
        }
        assert_eq!(policy.max_attempts(), 601);
    }

    #[test]
    fn test_once_has_single_attempt() {
        assert_eq!(RetryPolicy::once().max_attempts(), 1);
    }

    #[test]
    fn test_fixed() {
        let policy = RetryPolicy::fixed(5, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.next(4), Duration::from_millis(10));
    }

    #[test]
    fn test_growth_clamped_to_max() {
        let policy = RetryPolicy {
            retry_count: 10,
            delay: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(3), Duration::from_millis(800));
        assert_eq!(policy.next(4), Duration::from_secs(1));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_full_jitter_never_exceeds_base() {
        let policy = RetryPolicy {
            jitter: JitterPolicy::Full,
            ..RetryPolicy::fixed(3, Duration::from_millis(40))
        };
        for retry in 0..20 {
            assert!(policy.next(retry) <= Duration::from_millis(40));
        }
    }

    #[test]
    fn test_retry_count_saturates() {
        let policy = RetryPolicy {
            retry_count: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.max_attempts(), u32::MAX);
    }
}
