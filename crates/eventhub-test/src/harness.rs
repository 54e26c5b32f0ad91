//! Logging and polling helpers for tests.

use std::thread;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

/// Generous upper bound for asynchronous deliveries in tests.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Route `tracing` output through the test harness, filtered by `filter`
/// (e.g. `"eventhub=trace"`). `RUST_LOG` wins when set.
///
/// Safe to call from every test: only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

/// Poll `condition` until it holds or `timeout` elapses.
/// Returns the last value of `condition`.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if condition() {
            return true;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return condition();
        }
        thread::sleep(POLL_INTERVAL);
    }
}
