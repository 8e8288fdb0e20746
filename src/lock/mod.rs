//! # Lock provider abstraction and implementations.
//!
//! The governor consumes exactly one capability: a distributed mutual-exclusion
//! primitive. This module defines it and ships what is needed around it:
//! - [`LockProvider`] - async trait: `acquire` / `release` / `extend`
//! - [`LockHandle`] - opaque ownership proof (resource, token, validity window)
//! - [`MemoryLockProvider`] - in-process provider with TTL, retry budget and drift
//! - [`ResourceLocker`] - run a closure under the lock of one `(type, id)` resource
//!
//! Distributed providers (quorum locks over several stores) implement [`LockProvider`]
//! outside this crate.

mod handle;
mod memory;
mod provider;
mod resource;

pub use handle::LockHandle;
pub use memory::MemoryLockProvider;
pub use provider::LockProvider;
pub use resource::ResourceLocker;
