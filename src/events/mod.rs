//! Governor events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by slot attempts, permits and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Governor::submit` attempts, `SlotPermit` release path,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the governor's subscriber listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Governor::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
