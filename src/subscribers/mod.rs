//! # Event subscribers for governors.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out used
//! to deliver [`Event`](crate::Event)s broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! slot attempts ── publish(Event) ──► Bus ──► governor listener ──► SubscriberSet::emit
//!                                                                    │
//!                                                          ┌─────────┼─────────┐
//!                                                          ▼         ▼         ▼
//!                                                      LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
