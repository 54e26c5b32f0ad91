//! Subscription registry keyed by event type, then by subscription id.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::event::{Event, EventType};
use crate::handler::OnEvent;
use crate::subscription::{ErasedSubscription, Subscription, SubscriptionId};

type Entries = HashMap<SubscriptionId, Arc<dyn ErasedSubscription>>;

/// A live subscription captured for one publish, with its handler upgraded.
pub(crate) struct Delivery<E> {
    pub(crate) subscription: Arc<Subscription<E>>,
    pub(crate) target: Arc<dyn OnEvent<E>>,
}

/// Registry shared by a hub and the tokens it hands out.
///
/// Every removal returns the removed entries to the caller's stack and drops
/// them only after the lock is released: dropping a subscription drops its
/// handler and predicate, and their `Drop` impls may call back into the hub.
#[derive(Default)]
pub(crate) struct Registry {
    by_type: RwLock<HashMap<EventType, Entries>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.read();
        f.debug_struct("Registry")
            .field("event_types", &map.len())
            .field("subscriptions", &map.values().map(HashMap::len).sum::<usize>())
            .finish()
    }
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<EventType, Entries>> {
        self.by_type.read().unwrap_or_else(|e| {
            warn!("Registry read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<EventType, Entries>> {
        self.by_type.write().unwrap_or_else(|e| {
            warn!("Registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    pub(crate) fn insert<E: Event>(&self, subscription: Arc<Subscription<E>>) {
        let event_type = EventType::of::<E>();
        let id = subscription.id();
        self.write()
            .entry(event_type)
            .or_default()
            .insert(id, subscription as Arc<dyn ErasedSubscription>);

        debug!(%event_type, subscription_id = %id, "Subscription registered");
    }

    /// Removes one subscription. A miss is not an error.
    pub(crate) fn remove(&self, event_type: EventType, id: SubscriptionId) -> bool {
        let removed = {
            let mut map = self.write();
            let Some(entries) = map.get_mut(&event_type) else {
                return false;
            };
            let removed = entries.remove(&id);
            if entries.is_empty() {
                map.remove(&event_type);
            }
            removed
        };

        let found = removed.is_some();
        if found {
            debug!(%event_type, subscription_id = %id, "Subscription removed");
        }
        drop(removed);
        found
    }

    /// Captures every live subscription for `E` and prunes the ones whose
    /// weakly held handler is gone.
    ///
    /// Handlers are upgraded while the entry is still registered, so a
    /// subscription is either delivered to or pruned, never both.
    pub(crate) fn snapshot<E: Event>(&self) -> Vec<Delivery<E>> {
        let event_type = EventType::of::<E>();
        let mut live = Vec::new();
        let mut decayed = Vec::new();

        {
            let map = self.read();
            let Some(entries) = map.get(&event_type) else {
                return live;
            };
            live.reserve(entries.len());

            for (id, erased) in entries {
                let Ok(subscription) = Arc::clone(erased).into_any().downcast::<Subscription<E>>()
                else {
                    continue;
                };
                match subscription.target() {
                    Some(target) => live.push(Delivery {
                        subscription,
                        target,
                    }),
                    None => decayed.push(*id),
                }
            }
        }

        if !decayed.is_empty() {
            let pruned = self.prune(event_type, &decayed);
            debug!(%event_type, pruned = pruned.len(), "Pruned decayed subscriptions");
        }

        trace!(%event_type, live = live.len(), "Snapshot taken");
        live
    }

    fn prune(&self, event_type: EventType, ids: &[SubscriptionId]) -> Vec<Arc<dyn ErasedSubscription>> {
        let mut map = self.write();
        let Some(entries) = map.get_mut(&event_type) else {
            return Vec::new();
        };

        let mut pruned = Vec::with_capacity(ids.len());
        for id in ids {
            if entries.get(id).is_some_and(|sub| sub.is_decayed())
                && let Some(sub) = entries.remove(id)
            {
                pruned.push(sub);
            }
        }
        if entries.is_empty() {
            map.remove(&event_type);
        }
        pruned
    }

    pub(crate) fn contains(&self, event_type: EventType, id: SubscriptionId) -> bool {
        self.read()
            .get(&event_type)
            .is_some_and(|entries| entries.contains_key(&id))
    }

    /// Registered subscriptions for one type, including weak ones not yet pruned.
    pub(crate) fn count(&self, event_type: EventType) -> usize {
        self.read().get(&event_type).map_or(0, HashMap::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub(crate) fn clear(&self) {
        let drained: Vec<Entries> = self.write().drain().map(|(_, entries)| entries).collect();
        debug!(event_types = drained.len(), "All subscriptions cleared");
        drop(drained);
    }
}
