//! Prelude module - commonly used test helpers.
//!
//! Use `use eventhub_test::prelude::*;` in test modules.

pub use crate::{DEFAULT_WAIT, Ping, Pong, Recorder, Tick, setup_test_logging, wait_until};
