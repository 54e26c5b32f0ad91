//! Eventhub Test - Shared test utilities for eventhub.
//!
//! This crate provides sample events, recording handlers and polling helpers
//! that can be used across eventhub crates as a dev-dependency.
//!
//! It does not depend on `eventhub`: recorders hand out plain closures, which
//! the hub accepts as handlers.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! eventhub-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use eventhub::EventHub;
//! use eventhub_test::{Ping, Recorder};
//!
//! #[test]
//! fn test_ping_is_recorded() {
//!     let hub = EventHub::new();
//!     let recorder = Recorder::<Ping>::new();
//!     let _token = hub.subscribe_for_token(recorder.handler()).unwrap();
//!
//!     hub.publish(Ping::new(1));
//!     assert_eq!(recorder.events(), vec![Ping::new(1)]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod recorder;

pub use fixtures::*;
pub use harness::*;
pub use recorder::*;
