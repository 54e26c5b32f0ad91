//! Notification and predicate capabilities.

/// Receives published events of type `E`.
///
/// Implemented for every `Fn(&E) + Send + Sync` closure. Handlers should
/// return quickly: on [`PublicationMode::CallingThread`](crate::PublicationMode::CallingThread)
/// they run inside the publisher's call to `publish`.
pub trait OnEvent<E>: Send + Sync {
    /// Called once per delivered event.
    fn on_event(&self, event: &E);
}

impl<E, F> OnEvent<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        self(event);
    }
}

/// Zero-argument gate evaluated on the publishing thread before dispatch.
///
/// Implemented for every `Fn() -> bool + Send + Sync` closure.
pub trait Predicate: Send + Sync {
    /// Return `true` to let the event through to the handler.
    fn check(&self) -> bool;
}

impl<F> Predicate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn check(&self) -> bool {
        self()
    }
}
