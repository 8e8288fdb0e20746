use std::time::Duration;

use async_trait::async_trait;

use crate::{error::LockError, lock::LockHandle};

/// Distributed mutual-exclusion capability consumed by the governor.
///
/// ## Contract
/// - At most one outstanding [`LockHandle`] per key system-wide at any instant
///   (modulo clock drift, which the provider accounts for in `validity`).
/// - A key left unreleased is reclaimed after `ttl`.
/// - `acquire` may retry internally; it surfaces [`LockError::Unavailable`] only once its
///   own retry budget is spent.
/// - `release` is safe to call on an expired or already released handle; it then reports
///   an error instead of touching somebody else's lock.
#[async_trait]
pub trait LockProvider: Send + Sync + 'static {
    /// Attempts to obtain exclusive ownership of `key` for up to `ttl`.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<LockHandle, LockError>;

    /// Releases ownership early.
    async fn release(&self, lock: &LockHandle) -> Result<(), LockError>;

    /// Extends a held lock to expire `ttl` from now.
    async fn extend(&self, lock: &LockHandle, ttl: Duration) -> Result<LockHandle, LockError>;
}
