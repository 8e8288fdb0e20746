//! # Governor: the admission race.
//!
//! ```text
//! submit(body)
//!   ├─► start = cursor.advance()                    (sync, before any lock I/O)
//!   ├─► publish(AdmissionRequested)
//!   ├─► for i in 0..N: tokio::spawn(attempt(slot = (start + i) % N))
//!   └─► await reply
//!
//! attempt(slot):
//!   provider.acquire("{prefix}:{slot}", ttl)
//!     ├─ Err(e)                    ─► AttemptFailed ─► finish(Failed)
//!     ├─ Ok(lock) && try_win()     ─► AttemptWon ─► body(SlotPermit)
//!     │                                 └─ permit.release(res) ─► finish(Won, res)
//!     └─ Ok(lock) && already won   ─► AttemptLost ─► release(lock) ─► finish(Lost)
//! ```
//!
//! Attempts are detached tasks: dropping the `submit` future (for example under
//! `tokio::time::timeout`) stops waiting for the reply but never strands a lock; every
//! attempt still runs to its terminal state and releases what it acquired.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::DropGuard;

use super::{
    admission::{Admission, AttemptOutcome},
    builder::GovernorBuilder,
    cursor::RotationCursor,
    permit::SlotPermit,
    request::AdmissionRequest,
};
use crate::{
    config::GovernorConfig,
    error::{ConfigError, TaskError},
    events::{Bus, Event, EventKind},
    lock::LockProvider,
};

/// Caps concurrent executions of one task class across every process sharing a
/// [`LockProvider`].
///
/// The governor is `Send + Sync`; share it behind `Arc` and call
/// [`submit`](Self::submit) from as many tasks as needed.
pub struct Governor {
    cfg: GovernorConfig,
    name: Arc<str>,
    key_prefix: Arc<str>,
    provider: Arc<dyn LockProvider>,
    cursor: RotationCursor,
    bus: Bus,
    _listener: Option<DropGuard>,
}

/// One slot attempt, moved into its own task.
struct Attempt {
    provider: Arc<dyn LockProvider>,
    request: Arc<AdmissionRequest>,
    key: String,
    slot: usize,
    ttl: std::time::Duration,
}

impl Governor {
    /// Creates a governor without subscribers.
    ///
    /// Returns [`ConfigError`] for an invalid configuration.
    pub fn new(cfg: GovernorConfig, provider: Arc<dyn LockProvider>) -> Result<Self, ConfigError> {
        GovernorBuilder::new(cfg).build(provider)
    }

    /// Returns a builder for a governor with subscribers.
    pub fn builder(cfg: GovernorConfig) -> GovernorBuilder {
        GovernorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: GovernorConfig,
        provider: Arc<dyn LockProvider>,
        bus: Bus,
        listener: Option<DropGuard>,
    ) -> Self {
        Self {
            name: Arc::from(cfg.name.as_str()),
            key_prefix: Arc::from(cfg.key_prefix()),
            cursor: RotationCursor::new(cfg.max_concurrency),
            cfg,
            provider,
            bus,
            _listener: listener,
        }
    }

    /// Configuration this governor was built with.
    pub fn config(&self) -> &GovernorConfig {
        &self.cfg
    }

    /// Prefix of every slot key.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Lock key of `slot`.
    pub fn slot_key(&self, slot: usize) -> String {
        format!("{}:{slot}", self.key_prefix)
    }

    /// Receiver of every event published by this governor.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Races for a free slot and runs `body` in it.
    ///
    /// One lock attempt per slot is issued concurrently, starting from the rotation cursor.
    /// The first attempt to acquire runs `body` with a [`SlotPermit`]; the others release
    /// whatever they acquire. Resolves exactly once:
    /// - `Ok(Admission::Completed { slot })` after the permit was released with `Ok(())`;
    /// - `Err(TaskError)` after the permit was released with an error (or abandoned);
    /// - `Ok(Admission::Declined { .. })` if no attempt obtained a slot.
    ///
    /// Must be polled inside a tokio runtime.
    pub async fn submit<F, Fut>(&self, body: F) -> Result<Admission, TaskError>
    where
        F: FnOnce(SlotPermit) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let n = self.cfg.max_concurrency;
        let start = self.cursor.advance();

        let (tx, rx) = oneshot::channel();
        let request = Arc::new(AdmissionRequest::new(
            self.name.clone(),
            self.bus.clone(),
            n,
            tx,
        ));
        tracing::trace!(governor = %self.name, request = request.id(), start, "admission requested");
        self.bus.publish(
            Event::new(EventKind::AdmissionRequested)
                .with_governor(self.name.clone())
                .with_request(request.id())
                .with_slot(start),
        );

        let body = Arc::new(Mutex::new(Some(body)));
        for i in 0..n {
            let slot = (start + i) % n;
            let attempt = Attempt {
                provider: Arc::clone(&self.provider),
                request: Arc::clone(&request),
                key: self.slot_key(slot),
                slot,
                ttl: self.cfg.ttl,
            };
            tokio::spawn(attempt.run(Arc::clone(&body)));
        }
        drop(request);

        rx.await
            .unwrap_or_else(|_| Err(TaskError::fatal("admission request dropped without reply")))
    }

    /// Runs `task(slot)` in a free slot and releases it with the task's result.
    ///
    /// Convenience over [`submit`](Self::submit) for tasks that never need the permit.
    pub async fn run<F, Fut>(&self, task: F) -> Result<Admission, TaskError>
    where
        F: FnOnce(usize) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit(move |permit: SlotPermit| async move {
            let res = task(permit.slot()).await;
            permit.release(res);
        })
        .await
    }
}

impl Attempt {
    async fn run<F, Fut>(self, body: Arc<Mutex<Option<F>>>)
    where
        F: FnOnce(SlotPermit) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Attempt {
            provider,
            request,
            key,
            slot,
            ttl,
        } = self;

        let lock = match provider.acquire(&key, ttl).await {
            Ok(lock) => lock,
            Err(e) => {
                request.attempt_failed(slot, &key, &e);
                request.finish(AttemptOutcome::Failed, slot, None);
                return;
            }
        };

        if !request.try_win() {
            request.attempt_lost(slot, &lock);
            request.release_slot(provider.as_ref(), slot, &lock).await;
            request.finish(AttemptOutcome::Lost, slot, None);
            return;
        }

        request.attempt_won(slot, &lock);
        let body = body.lock().unwrap_or_else(PoisonError::into_inner).take();
        match body {
            Some(body) => body(SlotPermit::new(slot, lock, provider, request)).await,
            None => {
                request.release_slot(provider.as_ref(), slot, &lock).await;
                request.finish(
                    AttemptOutcome::Won,
                    slot,
                    Some(Err(TaskError::fatal("task body already taken"))),
                );
            }
        }
    }
}

impl std::fmt::Debug for Governor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Governor")
            .field("name", &self.name)
            .field("key_prefix", &self.key_prefix)
            .field("max_concurrency", &self.cfg.max_concurrency)
            .field("ttl", &self.cfg.ttl)
            .finish_non_exhaustive()
    }
}
