//! Scheduler backed by a tokio runtime.

use tokio::runtime::Handle;

use super::{Job, Scheduler};
use crate::error::{HubError, HubResult};

/// Runs jobs on the blocking pool of a tokio runtime.
///
/// Jobs may run in parallel with each other; use it as a
/// [`PublicationMode::Custom`](crate::PublicationMode::Custom) scheduler
/// where ordering between deliveries does not matter.
#[derive(Debug, Clone)]
pub struct RuntimeScheduler {
    name: String,
    handle: Handle,
}

impl RuntimeScheduler {
    /// Wrap an existing runtime handle.
    pub fn new(name: impl Into<String>, handle: Handle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Use the runtime the caller is running inside.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] outside a tokio runtime.
    pub fn current(name: impl Into<String>) -> HubResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| HubError::invalid("handle", e.to_string()))?;
        Ok(Self::new(name, handle))
    }
}

impl Scheduler for RuntimeScheduler {
    fn post(&self, job: Job) -> HubResult<()> {
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
