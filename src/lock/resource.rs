//! # Resource locking helper.
//!
//! [`ResourceLocker`] serializes work on one logical resource (`type`, `id`) across every
//! process sharing a [`LockProvider`]:
//!
//! ```text
//! with_lock("order", "42", f)
//!   └─► acquire("{prefix}:order:42", ttl) ─► Err ─► return Err(LockError)
//!                                          └► Ok(lock) ─► f(lock).await ─► release ─► Ok(T)
//! ```
//!
//! Unlike the governor, an acquisition failure **is** returned to the caller here: there is
//! exactly one key and nothing else to fall back to. Release failures are only logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::LockError,
    lock::{LockHandle, LockProvider},
};

/// Runs closures under a per-resource lock.
#[derive(Clone)]
pub struct ResourceLocker {
    provider: Arc<dyn LockProvider>,
    prefix: String,
    ttl: Duration,
}

impl ResourceLocker {
    /// Creates a locker with prefix `"default:resource-lock"` and a 5s TTL.
    pub fn new(provider: Arc<dyn LockProvider>) -> Self {
        Self {
            provider,
            prefix: "default:resource-lock".to_string(),
            ttl: Duration::from_secs(5),
        }
    }

    /// Returns a locker with prefix `"{namespace}:resource-lock"`.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.prefix = format!("{namespace}:resource-lock");
        self
    }

    /// Returns a locker with an explicit key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns a locker with the given lock TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Lock key of one resource.
    pub fn resource_key(&self, kind: &str, id: &str) -> String {
        format!("{}:{kind}:{id}", self.prefix)
    }

    /// Runs `f` while holding the lock of (`kind`, `id`).
    ///
    /// The handle is passed to `f` so long-running work can extend it through the provider.
    pub async fn with_lock<F, Fut, T>(&self, kind: &str, id: &str, f: F) -> Result<T, LockError>
    where
        F: FnOnce(LockHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let key = self.resource_key(kind, id);
        let lock = self.provider.acquire(&key, self.ttl).await.inspect_err(|e| {
            tracing::warn!(resource = %key, error = %e, "failed to obtain resource lock");
        })?;

        let out = f(lock.clone()).await;

        if let Err(e) = self.provider.release(&lock).await {
            tracing::warn!(resource = %key, error = %e, "failed to release resource lock");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lock::MemoryLockProvider, policies::RetryPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn locker(retries: u32) -> (Arc<MemoryLockProvider>, ResourceLocker) {
        let provider = Arc::new(
            MemoryLockProvider::new().with_retry(RetryPolicy::fixed(retries, Duration::from_millis(5))),
        );
        let locker = ResourceLocker::new(provider.clone()).with_namespace("test");
        (provider, locker)
    }

    #[tokio::test]
    async fn test_runs_under_lock_and_releases() {
        let (provider, locker) = locker(0);
        let key = locker.resource_key("order", "42");
        assert_eq!(key, "test:resource-lock:order:42");

        let probe = provider.clone();
        let seen = locker
            .with_lock("order", "42", |lock| async move {
                assert_eq!(lock.resource(), "test:resource-lock:order:42");
                probe.is_locked(lock.resource()).await
            })
            .await
            .unwrap();

        assert!(seen);
        assert!(!provider.is_locked(&key).await);
    }

    #[tokio::test]
    async fn test_contended_resource_is_reported() {
        let (provider, locker) = locker(0);
        let held = provider
            .acquire(&locker.resource_key("order", "1"), Duration::from_secs(5))
            .await
            .unwrap();

        let res = locker.with_lock("order", "1", |_| async { 1 }).await;
        assert!(matches!(res, Err(LockError::Unavailable { .. })));

        provider.release(&held).await.unwrap();
        assert_eq!(locker.with_lock("order", "1", |_| async { 1 }).await, Ok(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_serializes_same_resource() {
        let (_provider, locker) = locker(500);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut joins = Vec::new();
        for _ in 0..4 {
            let locker = locker.clone();
            let active = active.clone();
            let peak = peak.clone();
            joins.push(tokio::spawn(async move {
                locker
                    .with_lock("doc", "7", |_| async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
            }));
        }
        for j in joins {
            j.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
