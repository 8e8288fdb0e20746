//! # Admission outcomes
//!
//! A governed request ends in exactly one of two ways:
//!
//! - `Completed`: one slot attempt won the race, the task ran and released its permit.
//! - `Declined`: every slot attempt lost or failed; the task never ran.
//!
//! A task error is not an outcome: it is returned as `Err(TaskError)` from
//! [`Governor::submit`](crate::Governor::submit).

/// Result of one admission request whose task did not report an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The task ran in `slot` and released it without error.
    Completed {
        /// Slot index the task ran in.
        slot: usize,
    },

    /// No slot could be obtained; the task was not run.
    ///
    /// Use when deciding whether to resubmit later, queue elsewhere, or shed load.
    Declined {
        /// Slot attempts made (always the concurrency limit).
        attempts: usize,
    },
}

impl Admission {
    /// True if the task actually ran.
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Admission::Completed { .. })
    }

    /// True if every slot was busy or unavailable.
    #[inline]
    pub fn is_declined(&self) -> bool {
        matches!(self, Admission::Declined { .. })
    }

    /// Slot the task ran in, if it ran.
    #[inline]
    pub fn slot(&self) -> Option<usize> {
        match self {
            Admission::Completed { slot } => Some(*slot),
            Admission::Declined { .. } => None,
        }
    }
}

/// Terminal state of one slot attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    /// First to acquire; ran the task.
    Won,
    /// Acquired after another attempt won; released unused.
    Lost,
    /// The provider could not grant the slot.
    Failed,
}
