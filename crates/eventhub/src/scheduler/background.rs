//! Single dedicated worker thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Job, Scheduler, panic_message};
use crate::error::{HubError, HubResult};

/// Thread name used when none is configured.
pub const DEFAULT_BACKGROUND_THREAD_NAME: &str = "eventhub-background";

/// Runs jobs one at a time, in submission order, on its own OS thread.
///
/// The queue is unbounded; `post` never blocks. A job that panics is logged
/// and the worker moves on to the next one. The thread exits once the
/// scheduler (every clone of the hub holding it) is dropped and the queue
/// has drained.
#[derive(Debug)]
pub struct BackgroundScheduler {
    name: String,
    sender: mpsc::UnboundedSender<Job>,
    thread: ThreadId,
}

impl BackgroundScheduler {
    /// Start a worker named [`DEFAULT_BACKGROUND_THREAD_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::SchedulerSpawn`] if the OS refuses to create the thread.
    pub fn spawn() -> HubResult<Self> {
        Self::spawn_named(DEFAULT_BACKGROUND_THREAD_NAME)
    }

    /// Start a worker with the given thread name.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::SchedulerSpawn`] if the OS refuses to create the thread.
    pub fn spawn_named(name: impl Into<String>) -> HubResult<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let worker_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                        warn!(
                            scheduler = %worker_name,
                            panic = %panic_message(payload.as_ref()),
                            "Background handler panicked"
                        );
                    }
                }
                debug!(scheduler = %worker_name, "Background worker stopped");
            })
            .map_err(|e| HubError::SchedulerSpawn {
                scheduler: name.clone(),
                reason: e.to_string(),
            })?;

        let thread = handle.thread().id();
        debug!(scheduler = %name, "Background worker started");

        Ok(Self {
            name,
            sender,
            thread,
        })
    }

    /// Id of the worker thread.
    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }
}

impl Scheduler for BackgroundScheduler {
    fn post(&self, job: Job) -> HubResult<()> {
        self.sender
            .send(job)
            .map_err(|_| HubError::SchedulerClosed {
                scheduler: self.name.clone(),
            })
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn name(&self) -> &str {
        &self.name
    }
}
