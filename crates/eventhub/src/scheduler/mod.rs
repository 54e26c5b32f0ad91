//! Execution contexts a hub dispatches to.
//!
//! The hub only needs two capabilities from a scheduler: accept a unit of
//! work, and say whether the calling thread is the scheduler's own thread.
//! Three implementations ship with the crate:
//!
//! - [`BackgroundScheduler`]: one dedicated worker thread, strictly serial.
//! - [`AffinityQueue`]: a FIFO drained by one designated thread, typically
//!   the application's main or UI thread.
//! - `RuntimeScheduler` (feature `runtime`): the blocking pool of a tokio runtime.

mod affinity;
mod background;
#[cfg(feature = "runtime")]
mod runtime;

pub use affinity::AffinityQueue;
pub use background::{BackgroundScheduler, DEFAULT_BACKGROUND_THREAD_NAME};
#[cfg(feature = "runtime")]
pub use runtime::RuntimeScheduler;

use crate::error::HubResult;

/// A unit of work handed to a scheduler.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run work somewhere other than the publisher's stack.
pub trait Scheduler: Send + Sync {
    /// Enqueue `job`. Must not block on the job's execution.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::SchedulerClosed`](crate::HubError::SchedulerClosed)
    /// if the scheduler no longer accepts work; the job is dropped.
    fn post(&self, job: Job) -> HubResult<()>;

    /// Whether the calling thread is this scheduler's execution context.
    fn is_current(&self) -> bool {
        false
    }

    /// Name used in logs.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Extracts a readable message from a caught panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
