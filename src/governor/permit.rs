//! # Slot permit handed to the winning task.
//!
//! A [`SlotPermit`] is proof that the task owns one slot. It must be given back exactly
//! once via [`SlotPermit::release`]; consuming `self` makes a double release impossible.
//!
//! ```text
//! body(permit) ─► ... work ... ─► permit.release(result)
//!                                   └─► spawn { provider.release(lock); request.finish(Won, result) }
//!
//! drop(permit) without release
//!   └─► warn! + same path with Err(TaskError::Abandoned { slot })
//! ```
//!
//! Release runs on a task spawned onto the runtime that granted the permit, so it can be
//! called from synchronous code and from threads outside that runtime. Only when no
//! runtime handle was available at grant time is the lock left to TTL expiry.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{
    error::{LockError, TaskError},
    governor::{admission::AttemptOutcome, request::AdmissionRequest},
    lock::{LockHandle, LockProvider},
};

/// Ownership of one governor slot for the duration of a task.
pub struct SlotPermit {
    slot: usize,
    lock: LockHandle,
    inner: Option<Return>,
}

/// Everything needed to give the slot back.
struct Return {
    provider: Arc<dyn LockProvider>,
    request: Arc<AdmissionRequest>,
    runtime: Option<Handle>,
}

impl SlotPermit {
    pub(crate) fn new(
        slot: usize,
        lock: LockHandle,
        provider: Arc<dyn LockProvider>,
        request: Arc<AdmissionRequest>,
    ) -> Self {
        Self {
            slot,
            lock,
            inner: Some(Return {
                provider,
                request,
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Slot index in `[0, max_concurrency)`.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Lock currently held for this slot.
    #[inline]
    pub fn lock(&self) -> &LockHandle {
        &self.lock
    }

    /// Extends the slot lock so a long task is not reclaimed by TTL.
    ///
    /// On error the previous handle is kept; the task may still finish and release.
    pub async fn extend(&mut self, ttl: Duration) -> Result<(), LockError> {
        let Some(inner) = &self.inner else {
            return Err(LockError::NotHeld {
                resource: self.lock.resource().to_string(),
            });
        };
        let extended = inner.provider.extend(&self.lock, ttl).await?;
        self.lock = extended;
        Ok(())
    }

    /// Releases the slot and reports the task result to the waiting `submit`.
    ///
    /// Lock release failures are logged and never affect the reported result.
    pub fn release(mut self, result: Result<(), TaskError>) {
        if let Some(inner) = self.inner.take() {
            inner.finish(self.slot, self.lock.clone(), result);
        }
    }
}

impl Return {
    fn finish(self, slot: usize, lock: LockHandle, result: Result<(), TaskError>) {
        let Return {
            provider,
            request,
            runtime,
        } = self;
        match runtime.or_else(|| Handle::try_current().ok()) {
            Some(rt) => {
                rt.spawn(async move {
                    request.release_slot(provider.as_ref(), slot, &lock).await;
                    request.finish(AttemptOutcome::Won, slot, Some(result));
                });
            }
            None => {
                tracing::warn!(
                    slot,
                    resource = lock.resource(),
                    "no runtime to release slot lock; leaving it to expire"
                );
                request.finish(AttemptOutcome::Won, slot, Some(result));
            }
        }
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            tracing::warn!(
                slot = self.slot,
                resource = self.lock.resource(),
                "slot permit dropped without release"
            );
            inner.finish(
                self.slot,
                self.lock.clone(),
                Err(TaskError::Abandoned { slot: self.slot }),
            );
        }
    }
}

impl std::fmt::Debug for SlotPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPermit")
            .field("slot", &self.slot)
            .field("lock", &self.lock)
            .field("released", &self.inner.is_none())
            .finish()
    }
}
