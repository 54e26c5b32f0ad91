//! Eventhub - typed in-process publish/subscribe.
//!
//! This crate provides:
//! - A registry of subscriptions keyed by the exact runtime type of an event
//! - Weakly held subscriptions that expire on their own once the handler is dropped
//! - Token based subscriptions released explicitly, alone or as a [`CompositeToken`]
//! - Dispatch on the calling thread, a designated affinity ("main") thread, a
//!   dedicated background worker, or any custom [`Scheduler`]
//!
//! # Architecture
//!
//! ```text
//! subscribe / subscribe_for_token
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────┐
//! │ Registry  EventType ─► SubscriptionId ─► Sub │   (one RwLock per hub)
//! └──────────────────────┬───────────────────────┘
//!                        │ publish(event): snapshot, prune decayed, unlock
//!                        ▼
//!              predicate? ──false──► skip
//!                        │
//!          ┌─────────────┼──────────────┬─────────────────┐
//!          ▼             ▼              ▼                 ▼
//!   CallingThread    MainThread    BackgroundThread    Custom(tag)
//!    (inline)      (inline if on   (serial worker)    (Scheduler)
//!                  affinity thread,
//!                  else queued)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventhub::{EventHub, Token};
//!
//! struct Ping;
//!
//! let hub = EventHub::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&hits);
//! let token = hub
//!     .subscribe_for_token(move |_: &Ping| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//!
//! assert!(hub.publish(Ping));
//! token.release();
//! assert!(!hub.publish(Ping));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod event;
mod handler;
mod hub;
mod mode;
mod registry;
mod scheduler;
mod subscription;
mod token;

#[cfg(feature = "config")]
mod bridge;

pub use error::{HubError, HubResult};
pub use event::{Event, EventType};
pub use handler::{OnEvent, Predicate};
pub use hub::{EventHub, EventHubBuilder, SubscribeOptions, WeakEventHub};
pub use mode::{PublicationMode, SchedulerTag};
#[cfg(feature = "runtime")]
pub use scheduler::RuntimeScheduler;
pub use scheduler::{
    AffinityQueue, BackgroundScheduler, DEFAULT_BACKGROUND_THREAD_NAME, Job, Scheduler,
};
pub use subscription::SubscriptionId;
pub use token::{CompositeToken, SubscriptionToken, Token, TokenGuard};
