//! Recording handlers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::harness::wait_until;

struct Recorded<E> {
    events: Vec<E>,
    threads: Vec<ThreadId>,
}

/// Captures every event it is handed, and the thread it was handed on.
///
/// Clones share the same log, so a test can keep one clone and give the hub
/// a [`handler`](Self::handler) built from another.
pub struct Recorder<E> {
    inner: Arc<Mutex<Recorded<E>>>,
}

impl<E> Clone for Recorder<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Recorder<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorded {
                events: Vec::new(),
                threads: Vec::new(),
            })),
        }
    }
}

impl<E> Recorder<E> {
    // A panicking handler under test must not hide what was recorded before it.
    fn lock(&self) -> MutexGuard<'_, Recorded<E>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<E> fmt::Debug for Recorder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("count", &self.lock().events.len())
            .finish()
    }
}

impl<E: Clone + Send + 'static> Recorder<E> {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` as delivered on the current thread.
    pub fn record(&self, event: &E) {
        let mut recorded = self.lock();
        recorded.events.push(event.clone());
        recorded.threads.push(thread::current().id());
    }

    /// A handler closure that records into this recorder.
    pub fn handler(&self) -> impl Fn(&E) + Send + Sync + 'static {
        let recorder = self.clone();
        move |event: &E| recorder.record(event)
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().events.len()
    }

    /// Recorded events, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<E> {
        self.lock().events.clone()
    }

    /// Most recent event.
    #[must_use]
    pub fn last(&self) -> Option<E> {
        self.lock().events.last().cloned()
    }

    /// Thread each event was delivered on, in delivery order.
    #[must_use]
    pub fn threads(&self) -> Vec<ThreadId> {
        self.lock().threads.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut recorded = self.lock();
        recorded.events.clear();
        recorded.threads.clear();
    }

    /// Wait until at least `count` events were recorded.
    /// Returns `false` on timeout.
    #[must_use]
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.count() >= count)
    }
}
