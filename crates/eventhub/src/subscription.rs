//! Subscriptions: a handler bound to a publication mode and an optional predicate.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use uuid::Uuid;

use crate::event::{Event, EventType};
use crate::handler::{OnEvent, Predicate};
use crate::mode::PublicationMode;

/// Process-unique identity of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a subscription owns its handler. Exactly one discipline per subscription.
pub(crate) enum Target<E> {
    /// Does not keep the handler alive; the subscription dies with it.
    Weak(Weak<dyn OnEvent<E>>),
    /// Keeps the handler alive until the subscription is released.
    Strong(Arc<dyn OnEvent<E>>),
}

pub(crate) struct Subscription<E> {
    id: SubscriptionId,
    mode: PublicationMode,
    predicate: Option<Box<dyn Predicate>>,
    target: Target<E>,
}

impl<E: Event> Subscription<E> {
    pub(crate) fn new(
        target: Target<E>,
        mode: PublicationMode,
        predicate: Option<Box<dyn Predicate>>,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            mode,
            predicate,
            target,
        }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn mode(&self) -> &PublicationMode {
        &self.mode
    }

    /// The handler, or `None` once a weakly held handler has been dropped.
    pub(crate) fn target(&self) -> Option<Arc<dyn OnEvent<E>>> {
        match &self.target {
            Target::Weak(weak) => weak.upgrade(),
            Target::Strong(strong) => Some(Arc::clone(strong)),
        }
    }

    pub(crate) fn is_weak(&self) -> bool {
        matches!(self.target, Target::Weak(_))
    }

    /// Evaluates the predicate; a subscription without one always passes.
    pub(crate) fn can_notify(&self) -> bool {
        self.predicate.as_ref().is_none_or(|p| p.check())
    }
}

/// Object-safe view of a [`Subscription`] so the registry can hold every
/// event type in one map.
pub(crate) trait ErasedSubscription: Send + Sync {
    fn id(&self) -> SubscriptionId;
    fn is_decayed(&self) -> bool;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<E: Event> ErasedSubscription for Subscription<E> {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn is_decayed(&self) -> bool {
        match &self.target {
            Target::Weak(weak) => weak.strong_count() == 0,
            Target::Strong(_) => false,
        }
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<E: Event> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &EventType::of::<E>())
            .field("mode", &self.mode)
            .field("has_predicate", &self.predicate.is_some())
            .field("weak", &self.is_weak())
            .finish()
    }
}
