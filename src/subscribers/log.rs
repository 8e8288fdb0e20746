//! # Logging subscriber backed by `tracing`.
//!
//! [`LogWriter`] turns governor events into structured `tracing` records.
//! Lock-layer noise (lost/failed attempts) is logged at `debug`, release failures at
//! `warn`, admissions at `info`.
//!
//! ## Output (fmt layer)
//! ```text
//! INFO  admission requested governor=mailer request=3 start_slot=1
//! DEBUG attempt won governor=mailer request=3 slot=1 resource=default:governor:mailer:1
//! WARN  slot release failed governor=mailer request=3 slot=0 reason="not held: ..."
//! INFO  admission completed governor=mailer request=3 slot=1
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber emitting one `tracing` record per event.
///
/// Enabled via the `logging` feature. Install any `tracing` subscriber to see output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let governor = e.governor.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::AdmissionRequested => {
                info!(governor, request = ?e.request, start_slot = ?e.slot, "admission requested");
            }
            EventKind::AdmissionCompleted if e.reason.is_some() => {
                warn!(governor, request = ?e.request, slot = ?e.slot, reason, "admission completed with task error");
            }
            EventKind::AdmissionCompleted => {
                info!(governor, request = ?e.request, slot = ?e.slot, "admission completed");
            }
            EventKind::AdmissionDeclined => {
                info!(governor, request = ?e.request, "admission declined: all slots busy");
            }
            EventKind::AttemptWon => {
                debug!(governor, request = ?e.request, slot = ?e.slot, resource = ?e.resource, "attempt won");
            }
            EventKind::AttemptLost => {
                debug!(governor, request = ?e.request, slot = ?e.slot, "attempt lost");
            }
            EventKind::AttemptFailed => {
                debug!(governor, request = ?e.request, slot = ?e.slot, reason, "attempt failed");
            }
            EventKind::ReleaseFailed => {
                warn!(governor, request = ?e.request, slot = ?e.slot, reason, "slot release failed");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = governor, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = governor, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
