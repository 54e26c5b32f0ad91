//! Cancellation handles for token based subscriptions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

use crate::error::{HubError, HubResult};
use crate::event::EventType;
use crate::registry::Registry;
use crate::subscription::SubscriptionId;

/// One cancellation contract for every handle shape.
///
/// `Subscribed` to `Unsubscribed` is a one-way transition; releasing twice
/// has no further effect. Safe to call from any thread, including from
/// inside a handler.
pub trait Token: Send + Sync {
    /// Stop receiving notifications.
    fn release(&self);

    /// `true` until [`release`](Self::release) has been called.
    fn is_subscribed(&self) -> bool;
}

/// Handle returned by [`EventHub::subscribe_for_token`](crate::EventHub::subscribe_for_token).
///
/// The subscription keeps its handler alive until this token is released.
/// Dropping the token does **not** release it; use [`into_guard`](Self::into_guard)
/// for scope-bound subscriptions.
///
/// The token holds the registry weakly: it never keeps a hub alive, and
/// releasing it after the hub is gone is a no-op.
#[must_use = "the subscription stays registered until the token is released"]
pub struct SubscriptionToken {
    event_type: EventType,
    id: SubscriptionId,
    subscribed: AtomicBool,
    registry: Mutex<Option<Weak<Registry>>>,
}

impl SubscriptionToken {
    pub(crate) fn new(event_type: EventType, id: SubscriptionId, registry: &Arc<Registry>) -> Self {
        Self {
            event_type,
            id,
            subscribed: AtomicBool::new(true),
            registry: Mutex::new(Some(Arc::downgrade(registry))),
        }
    }

    /// Event type this token is subscribed to.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Id of the underlying subscription.
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }

    /// Wrap in a guard that releases the subscription when dropped.
    pub fn into_guard(self) -> TokenGuard<Self> {
        TokenGuard::new(self)
    }
}

impl Token for SubscriptionToken {
    fn release(&self) {
        if !self.subscribed.swap(false, Ordering::AcqRel) {
            return;
        }

        // Clear the registry link so repeat calls never reach the registry.
        let registry = self
            .registry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();

        match registry.and_then(|weak| weak.upgrade()) {
            Some(registry) => {
                registry.remove(self.event_type, self.id);
            },
            None => {
                debug!(
                    event_type = %self.event_type,
                    subscription_id = %self.id,
                    "Token released after hub was dropped"
                );
            },
        }
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("event_type", &self.event_type)
            .field("id", &self.id)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

/// Releases the wrapped token when dropped.
#[must_use = "dropping the guard releases the subscription immediately"]
pub struct TokenGuard<T: Token> {
    token: Option<T>,
}

impl<T: Token> TokenGuard<T> {
    /// Guard `token`.
    pub fn new(token: T) -> Self {
        Self { token: Some(token) }
    }

    /// Take the token back without releasing it. The guard is inert
    /// afterwards; a second call returns `None`.
    pub fn disarm(&mut self) -> Option<T> {
        self.token.take()
    }

    /// The guarded token.
    #[must_use]
    pub fn token(&self) -> Option<&T> {
        self.token.as_ref()
    }
}

impl<T: Token> Drop for TokenGuard<T> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.release();
        }
    }
}

impl<T: Token + fmt::Debug> fmt::Debug for TokenGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGuard").field("token", &self.token).finish()
    }
}

/// A group of tokens released together.
///
/// Members are deduplicated by identity. Once the group is released it stays
/// released: every member is released exactly once and later `add` calls are
/// no-ops. Groups may contain other groups; only adding a group to itself is
/// rejected.
pub struct CompositeToken {
    /// `None` once released.
    members: Mutex<Option<Vec<Arc<dyn Token>>>>,
}

impl CompositeToken {
    /// An empty, subscribed group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: Mutex::new(Some(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Arc<dyn Token>>>> {
        self.members.lock().unwrap_or_else(|e| {
            warn!("CompositeToken lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn is_self(&self, token: &Arc<dyn Token>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(token), std::ptr::from_ref(self))
    }

    /// Add a member.
    ///
    /// Does nothing if the group is already released, if `token` is already
    /// released, or if `token` is already a member.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if `token` is this group.
    pub fn add(&self, token: Arc<dyn Token>) -> HubResult<()> {
        if self.is_self(&token) {
            return Err(HubError::invalid("token", "a composite token cannot contain itself"));
        }

        // Checked before taking our own lock: `token` may be a group whose
        // lock another thread holds while adding this one to it.
        if !token.is_subscribed() {
            return Ok(());
        }

        let mut members = self.lock();
        let Some(members) = members.as_mut() else {
            return Ok(());
        };
        if !members.iter().any(|m| Arc::ptr_eq(m, &token)) {
            members.push(token);
        }
        Ok(())
    }

    /// Detach `token` from the group and release it.
    ///
    /// Returns `false` if it was not a member.
    pub fn remove(&self, token: &Arc<dyn Token>) -> bool {
        let removed = {
            let mut guard = self.lock();
            match guard.as_mut() {
                Some(members) => {
                    let index = members.iter().position(|m| Arc::ptr_eq(m, token));
                    index.map(|index| members.swap_remove(index))
                },
                None => None,
            }
        };

        match removed {
            Some(token) => {
                token.release();
                true
            },
            None => false,
        }
    }

    /// `true` while subscribed and holding at least one member.
    #[must_use]
    pub fn has_subscriptions(&self) -> bool {
        self.lock().as_ref().is_some_and(|members| !members.is_empty())
    }

    /// Number of members; `0` after release.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap in a guard that releases the whole group when dropped.
    pub fn into_guard(self) -> TokenGuard<Self> {
        TokenGuard::new(self)
    }
}

impl Token for CompositeToken {
    fn release(&self) {
        // Take the members out before releasing them: a member may be a
        // group that (transitively) contains this one.
        let Some(members) = self.lock().take() else {
            return;
        };
        debug!(members = members.len(), "Releasing composite token");
        for member in members {
            member.release();
        }
    }

    /// `true` until the group itself is released, even while empty.
    fn is_subscribed(&self) -> bool {
        self.lock().is_some()
    }
}

impl Default for CompositeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompositeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeToken")
            .field("subscribed", &self.is_subscribed())
            .field("members", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Token that counts how often it is actually released.
    #[derive(Default)]
    struct CountingToken {
        released: AtomicBool,
        calls: AtomicUsize,
    }

    impl Token for CountingToken {
        fn release(&self) {
            if !self.released.swap(true, Ordering::SeqCst) {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_subscribed(&self) -> bool {
            !self.released.load(Ordering::SeqCst)
        }
    }

    fn counting() -> Arc<CountingToken> {
        Arc::new(CountingToken::default())
    }

    #[test]
    fn test_new_group_is_subscribed_and_empty() {
        let group = CompositeToken::new();
        assert!(group.is_subscribed());
        assert!(group.is_empty());
        assert!(!group.has_subscriptions());
    }

    #[test]
    fn test_release_cascades_once() {
        let group = CompositeToken::new();
        let a = counting();
        let b = counting();
        group.add(a.clone()).unwrap();
        group.add(b.clone()).unwrap();
        assert_eq!(group.len(), 2);
        assert!(group.has_subscriptions());

        group.release();
        group.release();

        assert!(!group.is_subscribed());
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.len(), 0);
    }

    #[test]
    fn test_add_deduplicates_by_identity() {
        let group = CompositeToken::new();
        let a = counting();
        group.add(a.clone()).unwrap();
        group.add(a.clone()).unwrap();
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_add_released_token_is_noop() {
        let group = CompositeToken::new();
        let a = counting();
        a.release();
        group.add(a).unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn test_add_after_release_is_noop() {
        let group = CompositeToken::new();
        group.release();

        let a = counting();
        group.add(a.clone()).unwrap();
        assert!(group.is_empty());
        assert!(a.is_subscribed());
    }

    #[test]
    fn test_add_self_rejected() {
        let group = Arc::new(CompositeToken::new());
        let as_token: Arc<dyn Token> = group.clone();
        let err = group.add(as_token).unwrap_err();
        assert!(matches!(err, HubError::InvalidArgument { argument: "token", .. }));
        assert!(group.is_empty());
    }

    #[test]
    fn test_remove_detaches_and_releases() {
        let group = CompositeToken::new();
        let a = counting();
        let b = counting();
        let a_token: Arc<dyn Token> = a.clone();
        group.add(a_token.clone()).unwrap();
        group.add(b.clone()).unwrap();

        assert!(group.remove(&a_token));
        assert!(!a.is_subscribed());
        assert_eq!(group.len(), 1);
        assert!(!group.remove(&a_token));

        group.release();
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert!(!b.is_subscribed());
    }

    #[test]
    fn test_nested_cycle_releases_without_looping() {
        let outer = Arc::new(CompositeToken::new());
        let inner = Arc::new(CompositeToken::new());
        let leaf = counting();

        inner.add(leaf.clone()).unwrap();
        outer.add(inner.clone()).unwrap();
        inner.add(outer.clone()).unwrap();

        outer.release();
        assert!(!outer.is_subscribed());
        assert!(!inner.is_subscribed());
        assert_eq!(leaf.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let a = counting();
        let group = CompositeToken::new();
        group.add(a.clone()).unwrap();

        {
            let _guard = group.into_guard();
        }
        assert!(!a.is_subscribed());
    }

    #[test]
    fn test_disarmed_guard_keeps_token() {
        let a = counting();
        let group = CompositeToken::new();
        group.add(a.clone()).unwrap();

        let mut guard = group.into_guard();
        let group = guard.disarm().unwrap();
        assert!(guard.disarm().is_none());
        drop(guard);

        assert!(group.is_subscribed());
        assert!(a.is_subscribed());
    }

    #[test]
    fn test_groups_adding_each_other_concurrently() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..2_000 {
            let a = Arc::new(CompositeToken::new());
            let b = Arc::new(CompositeToken::new());
            let barrier = Arc::new(Barrier::new(2));

            let pairs = [
                (Arc::clone(&a), Arc::clone(&b)),
                (Arc::clone(&b), Arc::clone(&a)),
            ];
            let handles: Vec<_> = pairs
                .into_iter()
                .map(|(group, other)| {
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        group.add(other).unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(a.len(), 1);
            assert_eq!(b.len(), 1);
            a.release();
            assert!(!a.is_subscribed());
            assert!(!b.is_subscribed());
        }
    }

    #[test]
    fn test_subscription_token_release_without_hub() {
        let registry = Arc::new(Registry::new());
        let token = SubscriptionToken::new(
            EventType::of::<u32>(),
            SubscriptionId::new(),
            &registry,
        );
        drop(registry);

        assert!(token.is_subscribed());
        token.release();
        assert!(!token.is_subscribed());
        token.release();
    }
}
