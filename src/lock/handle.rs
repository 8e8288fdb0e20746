use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// Proof of ownership of one lock key, returned by
/// [`LockProvider::acquire`](crate::LockProvider::acquire).
///
/// The handle is opaque to the governor: it is passed to the winning task (for
/// extensions) and back to the provider on release. `validity` is the part of the TTL
/// the provider vouches for after subtracting its clock-drift allowance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockHandle {
    resource: Arc<str>,
    token: Uuid,
    acquired_at: Instant,
    validity: Duration,
}

impl LockHandle {
    /// Creates a handle acquired now.
    pub fn new(resource: impl Into<Arc<str>>, token: Uuid, validity: Duration) -> Self {
        Self {
            resource: resource.into(),
            token,
            acquired_at: Instant::now(),
            validity,
        }
    }

    /// Lock key.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Ownership token; release/extend only succeed for the current token.
    pub fn token(&self) -> Uuid {
        self.token
    }

    /// When the provider granted (or last extended) the lock.
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// Guaranteed ownership window, drift already subtracted.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// End of the guaranteed ownership window.
    pub fn expires_at(&self) -> Instant {
        self.acquired_at + self.validity
    }

    /// Time left in the ownership window (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.expires_at().saturating_duration_since(Instant::now())
    }

    /// True while the ownership window is open.
    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_validity_window() {
        let lock = LockHandle::new("k", Uuid::new_v4(), Duration::from_millis(100));
        assert!(lock.is_valid());
        assert_eq!(lock.remaining(), Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!lock.is_valid());
        assert_eq!(lock.remaining(), Duration::ZERO);
    }
}
