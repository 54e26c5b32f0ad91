//! Event identity.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker for values that can be published on a hub.
///
/// Implemented for every `'static + Send + Sync` type; there is nothing to
/// derive. Events are shared between handlers (and threads) behind an `Arc`,
/// so they are never cloned by the hub.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Runtime identity of an event type, used as the registry key.
///
/// Matching is exact: two distinct Rust types never compare equal, so a
/// handler registered for one type is never invoked for another.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Identity of `E`.
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Identity of the type of `event`.
    #[must_use]
    pub fn of_val<E: Event>(_event: &E) -> Self {
        Self::of::<E>()
    }

    /// Fully qualified type name, for diagnostics only.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    struct Pong;

    #[test]
    fn test_same_type_equal() {
        assert_eq!(EventType::of::<Ping>(), EventType::of_val(&Ping));
    }

    #[test]
    fn test_distinct_types_differ() {
        assert_ne!(EventType::of::<Ping>(), EventType::of::<Pong>());
    }

    #[test]
    fn test_wrapper_is_not_inner_type() {
        // No subtyping: a newtype around an event is its own event type.
        struct Wrapped(#[allow(dead_code)] Ping);
        assert_ne!(EventType::of::<Wrapped>(), EventType::of::<Ping>());
    }

    #[test]
    fn test_display_uses_type_name() {
        let ty = EventType::of::<Ping>();
        assert!(ty.to_string().ends_with("Ping"));
        assert!(format!("{ty:?}").contains("Ping"));
    }
}
