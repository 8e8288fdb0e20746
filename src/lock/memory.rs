//! # In-process lock provider.
//!
//! [`MemoryLockProvider`] implements the [`LockProvider`] contract for processes sharing
//! one address space: tests, demos, and single-node deployments.
//!
//! ## Semantics
//! ```text
//! acquire(key, ttl):
//!   loop attempt in 0..retry.max_attempts():
//!     ├─ key free or expired ─► store {token, now + ttl} ─► Ok(handle{validity})
//!     └─ key held            ─► sleep(retry.next(attempt))
//!   ─► Err(Unavailable{attempts})
//!
//! release(handle):  compare-and-delete on token  ─► Ok | Err(NotHeld)
//! extend(handle):   compare-and-refresh on token ─► Ok(handle') | Err(NotHeld)
//! ```
//!
//! `validity = ttl - (ttl × drift_factor + 2ms)`: a handle reports itself invalid slightly
//! before the store reclaims the key.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::{
    error::LockError,
    lock::{LockHandle, LockProvider},
    policies::RetryPolicy,
};

/// Fixed drift allowance added on top of the proportional one.
const DRIFT_FLOOR: Duration = Duration::from_millis(2);

struct Entry {
    token: Uuid,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Lock provider backed by an in-memory key table.
pub struct MemoryLockProvider {
    entries: Mutex<HashMap<String, Entry>>,
    retry: RetryPolicy,
    drift_factor: f64,
}

impl MemoryLockProvider {
    /// Creates a provider with `RetryPolicy::default()` and `drift_factor = 0.01`.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retry: RetryPolicy::default(),
            drift_factor: 0.01,
        }
    }

    /// Returns a provider with the given retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a provider with the given clock-drift factor (clamped to `[0, 1]`).
    pub fn with_drift_factor(mut self, drift_factor: f64) -> Self {
        self.drift_factor = drift_factor.clamp(0.0, 1.0);
        self
    }

    /// Retry policy used by `acquire`.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// True if `key` is currently held by anyone.
    pub async fn is_locked(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .get(key)
            .is_some_and(|e| e.is_live(now))
    }

    /// Number of keys currently held.
    pub async fn held(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    fn validity(&self, ttl: Duration) -> Duration {
        let drift = ttl.mul_f64(self.drift_factor) + DRIFT_FLOOR;
        ttl.saturating_sub(drift)
    }

    async fn try_lock(&self, key: &str, ttl: Duration) -> Option<LockHandle> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return None;
        }

        let token = Uuid::new_v4();
        entries.insert(
            key.to_string(),
            Entry {
                token,
                expires_at: now + ttl,
            },
        );
        Some(LockHandle::new(key, token, self.validity(ttl)))
    }
}

impl Default for MemoryLockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<LockHandle, LockError> {
        let attempts = self.retry.max_attempts();
        for attempt in 0..attempts {
            if let Some(lock) = self.try_lock(key, ttl).await {
                tracing::trace!(resource = key, attempt, "lock acquired");
                return Ok(lock);
            }
            if attempt + 1 < attempts {
                time::sleep(self.retry.next(attempt)).await;
            }
        }
        Err(LockError::Unavailable {
            resource: key.to_string(),
            attempts,
        })
    }

    async fn release(&self, lock: &LockHandle) -> Result<(), LockError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let owned = entries
            .get(lock.resource())
            .filter(|e| e.token == lock.token())
            .map(|e| e.is_live(now));

        match owned {
            Some(live) => {
                entries.remove(lock.resource());
                if live {
                    Ok(())
                } else {
                    Err(LockError::NotHeld {
                        resource: lock.resource().to_string(),
                    })
                }
            }
            None => Err(LockError::NotHeld {
                resource: lock.resource().to_string(),
            }),
        }
    }

    async fn extend(&self, lock: &LockHandle, ttl: Duration) -> Result<LockHandle, LockError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(lock.resource()) {
            Some(e) if e.token == lock.token() && e.is_live(now) => {
                e.expires_at = now + ttl;
                Ok(LockHandle::new(
                    lock.resource(),
                    lock.token(),
                    self.validity(ttl),
                ))
            }
            _ => Err(LockError::NotHeld {
                resource: lock.resource().to_string(),
            }),
        }
    }
}
