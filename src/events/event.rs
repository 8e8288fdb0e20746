//! # Runtime events emitted by governors and subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Admission events**: one per request (requested, completed, declined)
//! - **Attempt events**: one per slot attempt (won, lost, failed) plus release failures
//! - **Subscriber events**: fan-out problems (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as the governor name, request
//! id, slot index, lock resource and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use slotvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AttemptFailed)
//!     .with_governor("mailer")
//!     .with_request(7)
//!     .with_slot(1)
//!     .with_reason("unavailable");
//!
//! assert_eq!(ev.kind, EventKind::AttemptFailed);
//! assert_eq!(ev.governor.as_deref(), Some("mailer"));
//! assert_eq!(ev.slot, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `governor`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `governor`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Admission events ===
    /// A `submit` call fanned out its slot attempts.
    ///
    /// Sets:
    /// - `governor`, `request`
    /// - `slot`: starting slot picked by the rotation cursor
    AdmissionRequested,

    /// The winning task released its slot; the caller has been answered.
    ///
    /// Sets:
    /// - `governor`, `request`, `slot`
    /// - `reason`: task error message, if the task failed
    AdmissionCompleted,

    /// Every attempt lost or failed; no task ran.
    ///
    /// Sets:
    /// - `governor`, `request`
    AdmissionDeclined,

    // === Attempt events ===
    /// First acquisition of the request; this attempt runs the task.
    ///
    /// Sets:
    /// - `governor`, `request`, `slot`, `resource`
    AttemptWon,

    /// Acquired after another attempt already won; released without running.
    ///
    /// Sets:
    /// - `governor`, `request`, `slot`, `resource`
    AttemptLost,

    /// The lock provider could not grant the slot.
    ///
    /// Sets:
    /// - `governor`, `request`, `slot`, `resource`
    /// - `reason`: provider error message
    AttemptFailed,

    /// Releasing a slot lock failed; the lock is left to TTL expiry.
    ///
    /// Sets:
    /// - `governor`, `request`, `slot`, `resource`
    /// - `reason`: provider error message
    ReleaseFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Governor (or subscriber) name, if applicable.
    pub governor: Option<Arc<str>>,
    /// Admission request id (unique per process).
    pub request: Option<u64>,
    /// Slot index the event refers to.
    pub slot: Option<usize>,
    /// Lock key the event refers to.
    pub resource: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            governor: None,
            request: None,
            slot: None,
            resource: None,
            reason: None,
        }
    }

    /// Attaches a governor name.
    #[inline]
    pub fn with_governor(mut self, name: impl Into<Arc<str>>) -> Self {
        self.governor = Some(name.into());
        self
    }

    /// Attaches a request id.
    #[inline]
    pub fn with_request(mut self, id: u64) -> Self {
        self.request = Some(id);
        self
    }

    /// Attaches a slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a lock key.
    #[inline]
    pub fn with_resource(mut self, resource: impl Into<Arc<str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_governor(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_governor(subscriber)
            .with_reason(info)
    }

    /// True for events published by subscriber workers (overflow, panic).
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
