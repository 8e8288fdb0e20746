//! # Per-request race state.
//!
//! One [`AdmissionRequest`] is created per `submit` call and shared (behind `Arc`) by its
//! N slot attempts. All coordination is lock-free:
//!
//! ```text
//! winner:      AtomicBool   false ─CAS─► true        (first acquirer only)
//! replied:     AtomicBool   false ─swap─► true       (reply fires once)
//! outstanding: AtomicUsize  N ─► N-1 ─► ... ─► 0     (countdown latch)
//!
//! finish(attempt):
//!   remaining = outstanding.fetch_sub(1) - 1
//!   ├─ winner attempt with result ─► reply(result)
//!   ├─ remaining == 0 && !winner  ─► reply(Declined)
//!   └─ otherwise                  ─► nothing
//! ```
//!
//! The winner's result is always delivered: its `finish` carries the result and the
//! `replied` swap cannot have fired before it (no other path replies while a winner exists).

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::{
    error::{LockError, TaskError},
    events::{Bus, Event, EventKind},
    governor::admission::{Admission, AttemptOutcome},
    lock::{LockHandle, LockProvider},
};

/// Global request id counter (for events and logs).
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// What a `submit` caller eventually receives.
pub(crate) type Reply = Result<Admission, TaskError>;

pub(crate) struct AdmissionRequest {
    id: u64,
    governor: Arc<str>,
    bus: Bus,
    attempts: usize,

    winner: AtomicBool,
    replied: AtomicBool,
    outstanding: AtomicUsize,
    reply: Mutex<Option<oneshot::Sender<Reply>>>,
}

impl AdmissionRequest {
    /// Creates the state for a request racing over `attempts` slots.
    pub(crate) fn new(
        governor: Arc<str>,
        bus: Bus,
        attempts: usize,
        reply: oneshot::Sender<Reply>,
    ) -> Self {
        Self {
            id: REQUEST_SEQ.fetch_add(1, Ordering::Relaxed),
            governor,
            bus,
            attempts,
            winner: AtomicBool::new(false),
            replied: AtomicBool::new(false),
            outstanding: AtomicUsize::new(attempts),
            reply: Mutex::new(Some(reply)),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Claims the winner role. True for exactly one caller per request.
    pub(crate) fn try_win(&self) -> bool {
        self.winner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Records the end of one attempt and replies when this attempt settles the request.
    ///
    /// `result` is `Some` only for the winning attempt.
    pub(crate) fn finish(
        &self,
        outcome: AttemptOutcome,
        slot: usize,
        result: Option<Result<(), TaskError>>,
    ) {
        let remaining = self.outstanding.fetch_sub(1, Ordering::AcqRel) - 1;
        match result {
            Some(result) => {
                debug_assert_eq!(outcome, AttemptOutcome::Won);
                self.reply_completed(slot, result);
            }
            None if remaining == 0 && !self.winner.load(Ordering::Acquire) => {
                self.reply_declined();
            }
            None => {}
        }
    }

    /// Releases a slot lock; failures are logged and published, never escalated.
    pub(crate) async fn release_slot(
        &self,
        provider: &dyn LockProvider,
        slot: usize,
        lock: &LockHandle,
    ) {
        if let Err(e) = provider.release(lock).await {
            tracing::warn!(
                governor = %self.governor,
                request = self.id,
                slot,
                resource = lock.resource(),
                error = %e,
                "failed to release slot lock"
            );
            self.publish(
                self.event(EventKind::ReleaseFailed, slot)
                    .with_resource(lock.resource())
                    .with_reason(e.as_message()),
            );
        }
    }

    pub(crate) fn attempt_won(&self, slot: usize, lock: &LockHandle) {
        self.publish(self.event(EventKind::AttemptWon, slot).with_resource(lock.resource()));
    }

    pub(crate) fn attempt_lost(&self, slot: usize, lock: &LockHandle) {
        self.publish(self.event(EventKind::AttemptLost, slot).with_resource(lock.resource()));
    }

    pub(crate) fn attempt_failed(&self, slot: usize, key: &str, err: &LockError) {
        tracing::debug!(
            governor = %self.governor,
            request = self.id,
            slot,
            resource = key,
            error = %err,
            "slot attempt failed"
        );
        self.publish(
            self.event(EventKind::AttemptFailed, slot)
                .with_resource(key)
                .with_reason(err.as_message()),
        );
    }

    fn reply_completed(&self, slot: usize, result: Result<(), TaskError>) {
        let mut ev = self.event(EventKind::AdmissionCompleted, slot);
        if let Err(e) = &result {
            ev = ev.with_reason(e.as_message());
        }
        self.send(ev, result.map(|()| Admission::Completed { slot }));
    }

    fn reply_declined(&self) {
        tracing::debug!(
            governor = %self.governor,
            request = self.id,
            attempts = self.attempts,
            "no slot available"
        );
        let ev = Event::new(EventKind::AdmissionDeclined)
            .with_governor(self.governor.clone())
            .with_request(self.id);
        self.send(
            ev,
            Ok(Admission::Declined {
                attempts: self.attempts,
            }),
        );
    }

    /// Publishes `ev` and delivers `reply`, once per request.
    fn send(&self, ev: Event, reply: Reply) {
        if self.replied.swap(true, Ordering::AcqRel) {
            return;
        }
        self.publish(ev);

        let tx = self
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            // Caller gone (e.g. timed out): nothing left to notify.
            let _ = tx.send(reply);
        }
    }

    fn event(&self, kind: EventKind, slot: usize) -> Event {
        Event::new(kind)
            .with_governor(self.governor.clone())
            .with_request(self.id)
            .with_slot(slot)
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(n: usize) -> (Arc<AdmissionRequest>, oneshot::Receiver<Reply>, Bus) {
        let bus = Bus::new(64);
        let (tx, rx) = oneshot::channel();
        let req = Arc::new(AdmissionRequest::new("t".into(), bus.clone(), n, tx));
        (req, rx, bus)
    }

    #[test]
    fn test_single_winner() {
        let (req, _rx, _bus) = request(3);
        assert!(req.try_win());
        assert!(!req.try_win());
        assert!(!req.try_win());
    }

    #[test]
    fn test_declined_after_last_failure() {
        let (req, mut rx, _bus) = request(3);
        req.finish(AttemptOutcome::Failed, 0, None);
        req.finish(AttemptOutcome::Failed, 1, None);
        assert!(rx.try_recv().is_err());

        req.finish(AttemptOutcome::Failed, 2, None);
        assert_eq!(rx.try_recv().unwrap(), Ok(Admission::Declined { attempts: 3 }));
    }

    #[test]
    fn test_winner_replies_before_losers_finish() {
        let (req, mut rx, _bus) = request(3);
        assert!(req.try_win());
        req.finish(AttemptOutcome::Won, 2, Some(Ok(())));
        assert_eq!(rx.try_recv().unwrap(), Ok(Admission::Completed { slot: 2 }));

        req.finish(AttemptOutcome::Lost, 0, None);
        req.finish(AttemptOutcome::Failed, 1, None);
    }

    #[test]
    fn test_last_loser_does_not_override_pending_winner() {
        let (req, mut rx, _bus) = request(2);
        assert!(req.try_win());
        req.finish(AttemptOutcome::Lost, 1, None);
        assert!(rx.try_recv().is_err());

        req.finish(AttemptOutcome::Won, 0, Some(Err(TaskError::fail("boom"))));
        assert_eq!(rx.try_recv().unwrap(), Err(TaskError::fail("boom")));
    }

    #[test]
    fn test_reply_event_published_once() {
        let (req, _rx, bus) = request(1);
        let mut events = bus.subscribe();
        req.finish(AttemptOutcome::Failed, 0, None);

        let ev = events.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::AdmissionDeclined);
        assert_eq!(ev.request, Some(req.id()));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let (a, _, _) = request(1);
        let (b, _, _) = request(1);
        assert_ne!(a.id(), b.id());
    }
}
