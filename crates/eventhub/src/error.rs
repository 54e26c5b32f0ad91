//! Error types for the event hub.

use std::thread::ThreadId;

use thiserror::Error;

/// Errors raised synchronously by hub operations.
///
/// Failures inside user handlers and predicates are not represented here:
/// they are panics and unwind through [`EventHub::publish`](crate::EventHub::publish)
/// on synchronous delivery.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// A required argument was missing or unusable. Nothing was registered.
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// An affinity-bound operation was attempted from a foreign thread.
    #[error("affinity queue is bound to {expected:?}, called from {actual:?}")]
    WrongThread {
        /// Thread the queue is bound to.
        expected: ThreadId,
        /// Thread that made the call.
        actual: ThreadId,
    },

    /// A scheduler can no longer accept work.
    #[error("scheduler `{scheduler}` is closed")]
    SchedulerClosed {
        /// Scheduler name.
        scheduler: String,
    },

    /// A scheduler's worker thread could not be started.
    #[error("failed to start scheduler `{scheduler}`: {reason}")]
    SchedulerSpawn {
        /// Scheduler name.
        scheduler: String,
        /// Underlying OS error.
        reason: String,
    },
}

impl HubError {
    /// Shorthand for [`HubError::InvalidArgument`].
    pub(crate) fn invalid(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (`snake_case`) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eventhub::HubError;
    ///
    /// let err = HubError::SchedulerClosed { scheduler: "background".into() };
    /// assert_eq!(err.as_label(), "hub_scheduler_closed");
    /// ```
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "hub_invalid_argument",
            Self::WrongThread { .. } => "hub_wrong_thread",
            Self::SchedulerClosed { .. } => "hub_scheduler_closed",
            Self::SchedulerSpawn { .. } => "hub_scheduler_spawn",
        }
    }
}

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = HubError::invalid("mode", "no main-thread scheduler installed");
        assert_eq!(
            err.to_string(),
            "invalid argument `mode`: no main-thread scheduler installed"
        );
        assert_eq!(err.as_label(), "hub_invalid_argument");
    }

    #[test]
    fn test_wrong_thread_label() {
        let here = std::thread::current().id();
        let there = std::thread::spawn(|| std::thread::current().id())
            .join()
            .unwrap();
        let err = HubError::WrongThread {
            expected: there,
            actual: here,
        };
        assert_eq!(err.as_label(), "hub_wrong_thread");
        assert!(err.to_string().starts_with("affinity queue is bound to"));
    }
}
