//! Error types used by the governor, lock providers and governed tasks.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`] - invalid governor configuration, rejected at construction.
//! - [`LockError`] - failures reported by a [`LockProvider`](crate::LockProvider).
//! - [`TaskError`] - errors reported by a governed task through its permit.
//!
//! Only [`TaskError`] ever crosses [`Governor::submit`](crate::Governor::submit).
//! Lock-layer errors are absorbed per attempt: logged, published on the bus and folded
//! into [`Admission::Declined`](crate::Admission::Declined) when no slot was won.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced while validating a governor configuration.
///
/// Fatal: a governor is never constructed from an invalid config.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_concurrency` must be at least 1.
    #[error("max_concurrency must be >= 1 (got 0)")]
    ZeroConcurrency,

    /// The slot lock TTL must be non-zero.
    #[error("lock ttl must be greater than zero")]
    ZeroTtl,

    /// Governor name is empty.
    #[error("governor name must not be empty")]
    EmptyName,

    /// Explicit key prefix is empty.
    #[error("key prefix must not be empty")]
    EmptyKeyPrefix,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::ConfigError;
    ///
    /// assert_eq!(ConfigError::ZeroConcurrency.as_label(), "config_zero_concurrency");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroConcurrency => "config_zero_concurrency",
            ConfigError::ZeroTtl => "config_zero_ttl",
            ConfigError::EmptyName => "config_empty_name",
            ConfigError::EmptyKeyPrefix => "config_empty_key_prefix",
        }
    }
}

/// # Errors produced by a lock provider.
///
/// None of these are escalated by the governor: an acquisition failure turns the
/// attempt into a failed one, and a release failure is reported and left to TTL expiry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock could not be obtained within the provider's retry budget.
    #[error("resource '{resource}' unavailable after {attempts} attempts")]
    Unavailable {
        /// Key that was contended.
        resource: String,
        /// Number of acquisition attempts made.
        attempts: u32,
    },

    /// The handle no longer owns the key (expired, stolen or already released).
    #[error("lock on '{resource}' is not held")]
    NotHeld {
        /// Key the handle referred to.
        resource: String,
    },

    /// Any other provider failure (connection, protocol, quorum).
    #[error("lock backend error: {error}")]
    Backend {
        /// The underlying error message.
        error: String,
    },
}

impl LockError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::LockError;
    ///
    /// let err = LockError::NotHeld { resource: "k".into() };
    /// assert_eq!(err.as_label(), "lock_not_held");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LockError::Unavailable { .. } => "lock_unavailable",
            LockError::NotHeld { .. } => "lock_not_held",
            LockError::Backend { .. } => "lock_backend",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LockError::Unavailable { resource, attempts } => {
                format!("unavailable: {resource} (attempts={attempts})")
            }
            LockError::NotHeld { resource } => format!("not held: {resource}"),
            LockError::Backend { error } => format!("backend: {error}"),
        }
    }

    /// True when the failure only means "somebody else holds it".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LockError::Unavailable { .. })
    }
}

/// # Errors reported by a governed task.
///
/// A task hands its error to [`SlotPermit::release`](crate::SlotPermit::release);
/// the governor returns it verbatim from `submit`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error; callers should not resubmit.
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The slot permit was dropped without being released.
    #[error("slot {slot} permit dropped without release")]
    Abandoned {
        /// Slot the abandoned permit was holding.
        slot: usize,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Abandoned { .. } => "task_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Abandoned { slot } => format!("abandoned: slot={slot}"),
        }
    }

    /// Indicates whether resubmitting the task may succeed.
    ///
    /// Returns `true` only for [`TaskError::Fail`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ConfigError::ZeroTtl.as_label(), "config_zero_ttl");
        assert_eq!(
            LockError::Unavailable {
                resource: "a".into(),
                attempts: 3
            }
            .as_label(),
            "lock_unavailable"
        );
        assert_eq!(TaskError::Abandoned { slot: 1 }.as_label(), "task_abandoned");
    }

    #[test]
    fn test_task_error_retryable() {
        assert!(TaskError::fail("x").is_retryable());
        assert!(!TaskError::fatal("x").is_retryable());
        assert!(!TaskError::Abandoned { slot: 0 }.is_retryable());
    }

    #[test]
    fn test_lock_error_message() {
        let err = LockError::Unavailable {
            resource: "env:governor:x:1".into(),
            attempts: 4,
        };
        assert!(err.is_unavailable());
        assert_eq!(err.as_message(), "unavailable: env:governor:x:1 (attempts=4)");
        assert_eq!(
            err.to_string(),
            "resource 'env:governor:x:1' unavailable after 4 attempts"
        );
    }
}
