//! Step-level progress reporting for the orchestrators.
//!
//! Analysis runs report `current/total` steps with a message; callers either
//! pass a `&dyn Fn(Progress)` to the [`Analyzer`](crate::pipeline::Analyzer)
//! or receive the same values as events from a background worker.

use std::fmt;

/// One progress step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Steps completed so far.
    pub current: usize,

    /// Total steps in the run.
    pub total: usize,

    /// What is being done now.
    pub message: String,
}

impl Progress {
    /// Creates a progress step.
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// ```rust
    /// use chatminer::progress::Progress;
    ///
    /// assert_eq!(Progress::new(1, 4, "").percentage(), 25.0);
    /// assert_eq!(Progress::new(0, 0, "").percentage(), 100.0);
    /// ```
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }

    /// Returns whether every step is done.
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.current, self.total, self.message)
    }
}
