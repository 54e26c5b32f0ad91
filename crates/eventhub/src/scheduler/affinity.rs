//! Work queue bound to one designated thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use super::{Job, Scheduler};
use crate::error::{HubError, HubResult};

/// FIFO of jobs that only its owner thread may run.
///
/// Install one as the hub's main-thread scheduler when the application has
/// a loop of its own to drive it from (a UI loop, a game loop, the test
/// thread). Platforms with a native main-thread dispatcher should implement
/// [`Scheduler`] over that dispatcher instead.
///
/// Jobs run in the order they were posted. A panicking job unwinds into the
/// owner's call to [`run_pending`](Self::run_pending); jobs still queued
/// behind it stay queued.
pub struct AffinityQueue {
    owner: ThreadId,
    jobs: Mutex<VecDeque<Job>>,
    ready: Condvar,
}

impl fmt::Debug for AffinityQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityQueue")
            .field("owner", &self.owner)
            .field("pending", &self.pending())
            .finish()
    }
}

impl AffinityQueue {
    /// Queue owned by the calling thread.
    #[must_use]
    pub fn for_current_thread() -> Self {
        Self::bind(thread::current().id())
    }

    /// Queue owned by `owner`.
    #[must_use]
    pub fn bind(owner: ThreadId) -> Self {
        Self {
            owner,
            jobs: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// The owning thread.
    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Number of jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(|e| {
            warn!("AffinityQueue lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn ensure_owner(&self) -> HubResult<()> {
        let actual = thread::current().id();
        if actual == self.owner {
            Ok(())
        } else {
            Err(HubError::WrongThread {
                expected: self.owner,
                actual,
            })
        }
    }

    /// Run queued jobs until the queue is empty, including jobs posted by
    /// the jobs themselves. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::WrongThread`] when called off the owner thread.
    pub fn run_pending(&self) -> HubResult<usize> {
        self.ensure_owner()?;

        let mut ran: usize = 0;
        loop {
            // Pop under the lock, run without it: jobs may post more work.
            let Some(job) = self.lock().pop_front() else {
                break;
            };
            job();
            ran = ran.saturating_add(1);
        }

        if ran > 0 {
            trace!(ran, "Affinity queue drained");
        }
        Ok(ran)
    }

    /// Wait up to `timeout` for work to arrive, then run everything queued.
    /// Returns how many jobs ran; `0` means the wait timed out.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::WrongThread`] when called off the owner thread.
    pub fn run_for(&self, timeout: Duration) -> HubResult<usize> {
        self.ensure_owner()?;

        let deadline = Instant::now().checked_add(timeout);
        let mut jobs = self.lock();
        while jobs.is_empty() {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                return Ok(0);
            }
            let (guard, _) = self
                .ready
                .wait_timeout(jobs, remaining)
                .unwrap_or_else(|e| e.into_inner());
            jobs = guard;
        }
        drop(jobs);

        self.run_pending()
    }
}

impl Scheduler for AffinityQueue {
    fn post(&self, job: Job) -> HubResult<()> {
        self.lock().push_back(job);
        self.ready.notify_one();
        Ok(())
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "main-thread"
    }
}
