//! Lock retry policies.
//!
//! This module groups the knobs that control **how long** a lock provider keeps trying to
//! obtain a contended key before giving up.
//!
//! ## Contents
//! - [`RetryPolicy`] retry budget and delay growth (retry_count / delay / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy to avoid lockstep retries
//!
//! ## Quick wiring
//! ```text
//! MemoryLockProvider { retry: RetryPolicy }
//!      └─► acquire(key, ttl):
//!           try_lock → busy → sleep(retry.next(n)) → try_lock ... up to retry.max_attempts()
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 600 retries, 100ms constant delay, jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` when many processes share slots.

mod jitter;
mod retry;

pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
