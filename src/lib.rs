//! # slotvisor
//!
//! **Slotvisor** caps how many instances of a named task run at once across any number
//! of independent processes, using nothing but a distributed lock as shared state.
//!
//! A governor with concurrency limit N owns N lock keys ("slots"). Every submission races
//! for all N slots at once; the first slot obtained runs the task, the rest are released.
//! If every slot is busy or unavailable, the submission is declined.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   process A                 process B                 process C
//! ┌─────────────┐           ┌─────────────┐           ┌─────────────┐
//! │  Governor   │           │  Governor   │           │  Governor   │
//! │ ("mailer",  │           │ ("mailer",  │           │ ("mailer",  │
//! │   N = 2)    │           │   N = 2)    │           │   N = 2)    │
//! └──────┬──────┘           └──────┬──────┘           └──────┬──────┘
//!        │ acquire / release       │                         │
//!        ▼                         ▼                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                  LockProvider (shared lock store)                 │
//! │        env:governor:mailer:0          env:governor:mailer:1       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### One submission
//! ```text
//! submit(body)
//!   ├─► start = rotation cursor (advances, wraps at N)
//!   ├─► N concurrent attempts: slot (start + i) % N
//!   │     ├─ first to acquire ─► AttemptWon  ─► body(SlotPermit) ... permit.release(res)
//!   │     ├─ later acquirers  ─► AttemptLost ─► release immediately
//!   │     └─ provider error   ─► AttemptFailed
//!   └─► exactly one reply:
//!         ├─ Ok(Admission::Completed { slot })   task released Ok(())
//!         ├─ Err(TaskError)                      task released Err(..) or dropped the permit
//!         └─ Ok(Admission::Declined { .. })      no slot obtained
//! ```
//!
//! ### Events
//! ```text
//! attempts / permits ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                           │                   ┌─────────┼─────────┐
//!                                           │                   ▼         ▼         ▼
//!                                           │                LogWriter  custom    custom
//!                                           └──► Governor::subscribe() (raw receivers)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Admission**     | Global concurrency cap over a lock provider.                  | [`Governor`], [`SlotPermit`], [`Admission`]     |
//! | **Locks**         | Lock provider contract, in-memory provider, resource locking. | [`LockProvider`], [`MemoryLockProvider`], [`ResourceLocker`] |
//! | **Policies**      | Retry budget and jitter for lock acquisition.                 | [`RetryPolicy`], [`JitterPolicy`]               |
//! | **Subscriber API**| Hook into admission events (logging, metrics, custom).        | [`Subscribe`], [`SubscriberSet`]                |
//! | **Errors**        | Typed errors for configuration, locks and tasks.              | [`ConfigError`], [`LockError`], [`TaskError`]   |
//! | **Configuration** | One config per governed task class.                           | [`GovernorConfig`]                              |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use slotvisor::{Admission, Governor, GovernorConfig, MemoryLockProvider, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(MemoryLockProvider::new());
//!     let cfg = GovernorConfig::named("mailer")
//!         .with_namespace("dev")
//!         .with_max_concurrency(2)
//!         .with_ttl(Duration::from_secs(30));
//!
//!     let governor = Governor::new(cfg, provider)?;
//!
//!     let out = governor
//!         .submit(|permit| async move {
//!             println!("sending from slot {}", permit.slot());
//!             permit.release(Ok::<(), TaskError>(()));
//!         })
//!         .await?;
//!
//!     assert!(matches!(out, Admission::Completed { .. }));
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod governor;
mod lock;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use config::GovernorConfig;
pub use error::{ConfigError, LockError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use governor::{Admission, Governor, GovernorBuilder, SlotPermit};
pub use lock::{LockHandle, LockProvider, MemoryLockProvider, ResourceLocker};
pub use policies::{JitterPolicy, RetryPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
