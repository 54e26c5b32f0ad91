//! Prelude module - commonly used types for convenient import.
//!
//! Use `use eventhub::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use eventhub::prelude::*;
//!
//! struct Saved(u32);
//!
//! let hub = EventHub::builder()
//!     .default_mode(PublicationMode::CallingThread)
//!     .build()?;
//!
//! let handler = std::sync::Arc::new(|saved: &Saved| assert_eq!(saved.0, 7));
//! hub.subscribe(&handler)?;
//! assert!(hub.publish(Saved(7)));
//! # Ok::<(), HubError>(())
//! ```

// Hub
pub use crate::{EventHub, EventHubBuilder, SubscribeOptions, WeakEventHub};

// Events and handlers
pub use crate::{Event, EventType, OnEvent, Predicate};

// Dispatch
pub use crate::{AffinityQueue, BackgroundScheduler, Job, PublicationMode, Scheduler, SchedulerTag};

// Lifetime
pub use crate::{CompositeToken, SubscriptionId, SubscriptionToken, Token, TokenGuard};

// Errors
pub use crate::{HubError, HubResult};
