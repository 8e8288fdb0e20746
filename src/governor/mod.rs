//! Admission governor: bounded global concurrency over a lock provider.
//!
//! The only public API from this module is [`Governor`] (plus its builder, the
//! [`SlotPermit`] given to the winning task and the [`Admission`] outcome).
//!
//! Internal modules:
//! - [`cursor`]: process-local rotation of the starting slot;
//! - [`request`]: per-request race state (winner flag, reply latch, countdown);
//! - [`permit`]: slot ownership handed to the task, released once;
//! - [`core`]: `submit` fan-out and the per-slot attempt;
//! - [`builder`]: validation and subscriber wiring.

mod admission;
mod builder;
mod core;
mod cursor;
mod permit;
mod request;

pub use admission::Admission;
pub use builder::GovernorBuilder;
pub use core::Governor;
pub use permit::SlotPermit;
