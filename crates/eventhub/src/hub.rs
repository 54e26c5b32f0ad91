//! The event hub: subscribe, publish, dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tracing::{debug, trace, warn};

use crate::error::{HubError, HubResult};
use crate::event::{Event, EventType};
use crate::handler::{OnEvent, Predicate};
use crate::mode::{PublicationMode, SchedulerTag};
use crate::registry::{Delivery, Registry};
use crate::scheduler::{BackgroundScheduler, DEFAULT_BACKGROUND_THREAD_NAME, Scheduler};
use crate::subscription::{Subscription, SubscriptionId, Target};
use crate::token::SubscriptionToken;

static GLOBAL: OnceLock<EventHub> = OnceLock::new();

/// Per-subscription settings. Anything left unset falls back to the hub's defaults.
#[derive(Default)]
pub struct SubscribeOptions {
    mode: Option<PublicationMode>,
    predicate: Option<Box<dyn Predicate>>,
}

impl SubscribeOptions {
    /// Options with the hub's default mode and no predicate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the handler runs.
    #[must_use]
    pub fn mode(mut self, mode: PublicationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Gate evaluated on the publishing thread before each delivery.
    ///
    /// The predicate is owned by the subscription and dropped with it.
    #[must_use]
    pub fn predicate<P>(mut self, predicate: P) -> Self
    where
        P: Predicate + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("mode", &self.mode)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

struct HubInner {
    registry: Arc<Registry>,
    default_mode: PublicationMode,
    main_thread: Option<Arc<dyn Scheduler>>,
    background: Mutex<Option<Arc<dyn Scheduler>>>,
    background_thread_name: String,
    custom: HashMap<SchedulerTag, Arc<dyn Scheduler>>,
}

impl HubInner {
    fn background(&self) -> Option<Arc<dyn Scheduler>> {
        self.background
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Starts the background worker on first use.
    fn ensure_background(&self) -> HubResult<()> {
        let mut slot = self
            .background
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_none() {
            let scheduler = BackgroundScheduler::spawn_named(self.background_thread_name.clone())?;
            *slot = Some(Arc::new(scheduler));
        }
        Ok(())
    }

    fn scheduler_for(&self, mode: &PublicationMode) -> Option<Arc<dyn Scheduler>> {
        match mode {
            PublicationMode::CallingThread => None,
            PublicationMode::MainThread => self.main_thread.clone(),
            PublicationMode::BackgroundThread => self.background(),
            PublicationMode::Custom(tag) => self.custom.get(tag).cloned(),
        }
    }

    /// Rejects modes this hub cannot dispatch to, before anything is registered.
    fn validate_mode(&self, mode: &PublicationMode) -> HubResult<()> {
        match mode {
            PublicationMode::CallingThread => Ok(()),
            PublicationMode::MainThread if self.main_thread.is_none() => Err(HubError::invalid(
                "mode",
                "no main-thread scheduler installed on this hub",
            )),
            PublicationMode::MainThread => Ok(()),
            PublicationMode::BackgroundThread => self.ensure_background(),
            PublicationMode::Custom(tag) if !self.custom.contains_key(tag) => Err(
                HubError::invalid("mode", format!("no scheduler registered for tag '{tag}'")),
            ),
            PublicationMode::Custom(_) => Ok(()),
        }
    }
}

/// Typed publish/subscribe hub.
///
/// Cloning is cheap and every clone shares the same registry and schedulers.
/// All registry access goes through a single lock per hub; no handler or
/// predicate ever runs while it is held, so handlers may subscribe, release
/// tokens and publish freely.
///
/// **WARNING:** a token based subscription keeps its handler alive. A handler
/// that captures a clone of the hub therefore keeps the hub alive until its
/// token is released. Capture a [`WeakEventHub`] instead when the handler
/// needs to publish.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    /// A hub delivering on the calling thread by default, with no
    /// main-thread scheduler and a lazily started background worker.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            PublicationMode::CallingThread,
            None,
            None,
            DEFAULT_BACKGROUND_THREAD_NAME.to_string(),
            HashMap::new(),
        )
    }

    /// Start configuring a hub.
    #[must_use]
    pub fn builder() -> EventHubBuilder {
        EventHubBuilder::new()
    }

    fn from_parts(
        default_mode: PublicationMode,
        main_thread: Option<Arc<dyn Scheduler>>,
        background: Option<Arc<dyn Scheduler>>,
        background_thread_name: String,
        custom: HashMap<SchedulerTag, Arc<dyn Scheduler>>,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: Arc::new(Registry::new()),
                default_mode,
                main_thread,
                background: Mutex::new(background),
                background_thread_name,
                custom,
            }),
        }
    }

    /// Subscribe `handler` for events of type `E` without keeping it alive.
    ///
    /// The hub only holds a weak reference: once every `Arc` to the handler
    /// is dropped the subscription is discarded at the next publish of `E`.
    /// There is no handle; keeping the handler alive is the subscription.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if the hub's default mode cannot
    /// be dispatched to.
    pub fn subscribe<E, H>(&self, handler: &Arc<H>) -> HubResult<()>
    where
        E: Event,
        H: OnEvent<E> + 'static,
    {
        self.subscribe_with(handler, SubscribeOptions::new())
    }

    /// [`subscribe`](Self::subscribe) with an explicit mode and/or predicate.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if the requested mode cannot be
    /// dispatched to by this hub, or [`HubError::SchedulerSpawn`] if the
    /// background worker could not be started.
    pub fn subscribe_with<E, H>(&self, handler: &Arc<H>, options: SubscribeOptions) -> HubResult<()>
    where
        E: Event,
        H: OnEvent<E> + 'static,
    {
        let weak = Arc::downgrade(handler) as Weak<dyn OnEvent<E>>;
        self.register(Target::Weak(weak), options).map(|_| ())
    }

    /// Subscribe `handler` for events of type `E` and keep it alive until
    /// the returned token is released.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if the hub's default mode cannot
    /// be dispatched to.
    pub fn subscribe_for_token<E, H>(&self, handler: H) -> HubResult<SubscriptionToken>
    where
        E: Event,
        H: OnEvent<E> + 'static,
    {
        self.subscribe_for_token_with(handler, SubscribeOptions::new())
    }

    /// [`subscribe_for_token`](Self::subscribe_for_token) with an explicit
    /// mode and/or predicate.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if the requested mode cannot be
    /// dispatched to by this hub, or [`HubError::SchedulerSpawn`] if the
    /// background worker could not be started.
    pub fn subscribe_for_token_with<E, H>(
        &self,
        handler: H,
        options: SubscribeOptions,
    ) -> HubResult<SubscriptionToken>
    where
        E: Event,
        H: OnEvent<E> + 'static,
    {
        let strong: Arc<dyn OnEvent<E>> = Arc::new(handler);
        let id = self.register(Target::Strong(strong), options)?;
        Ok(SubscriptionToken::new(
            EventType::of::<E>(),
            id,
            &self.inner.registry,
        ))
    }

    fn register<E: Event>(
        &self,
        target: Target<E>,
        options: SubscribeOptions,
    ) -> HubResult<SubscriptionId> {
        let mode = options
            .mode
            .unwrap_or_else(|| self.inner.default_mode.clone());
        self.inner.validate_mode(&mode)?;

        let subscription = Arc::new(Subscription::new(target, mode, options.predicate));
        let id = subscription.id();
        self.inner.registry.insert(subscription);
        Ok(id)
    }

    /// Publish `event` to every live subscription registered for its exact type.
    ///
    /// Calling-thread handlers (and main-thread handlers when called on the
    /// main thread) have run by the time this returns; every other delivery
    /// has been queued. Returns whether at least one subscription passed its
    /// predicate and was dispatched to.
    ///
    /// # Panics
    ///
    /// A panic in a predicate or in a handler running inline propagates to
    /// the caller, and the remaining subscriptions are not notified.
    pub fn publish<E: Event>(&self, event: E) -> bool {
        self.publish_arc(Arc::new(event))
    }

    /// [`publish`](Self::publish) for an event that is already shared.
    ///
    /// # Panics
    ///
    /// See [`publish`](Self::publish).
    pub fn publish_arc<E: Event>(&self, event: Arc<E>) -> bool {
        let event_type = EventType::of::<E>();
        trace!(%event_type, "Publishing event");

        let deliveries = self.inner.registry.snapshot::<E>();
        if deliveries.is_empty() {
            trace!(%event_type, "No subscribers for event");
            return false;
        }

        let mut notified = false;
        for Delivery {
            subscription,
            target,
        } in deliveries
        {
            if !subscription.can_notify() {
                trace!(%event_type, subscription_id = %subscription.id(), "Predicate rejected event");
                continue;
            }
            notified |= self.dispatch(subscription.mode(), target, &event);
        }

        debug!(%event_type, notified, "Event published");
        notified
    }

    fn dispatch<E: Event>(
        &self,
        mode: &PublicationMode,
        target: Arc<dyn OnEvent<E>>,
        event: &Arc<E>,
    ) -> bool {
        if *mode == PublicationMode::CallingThread {
            target.on_event(event);
            return true;
        }

        let Some(scheduler) = self.inner.scheduler_for(mode) else {
            warn!(%mode, "No scheduler for publication mode, delivery dropped");
            return false;
        };

        if *mode == PublicationMode::MainThread && scheduler.is_current() {
            target.on_event(event);
            return true;
        }

        let event = Arc::clone(event);
        match scheduler.post(Box::new(move || target.on_event(&event))) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    scheduler = scheduler.name(),
                    error = %e,
                    "Scheduler rejected delivery"
                );
                false
            },
        }
    }

    /// Number of subscriptions registered for `E`, including weak ones whose
    /// handler is gone but that no publish has pruned yet.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inner.registry.count(EventType::of::<E>())
    }

    /// Total number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether no subscriptions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Whether the subscription behind `token` is still registered.
    #[must_use]
    pub fn is_registered(&self, token: &SubscriptionToken) -> bool {
        self.inner
            .registry
            .contains(token.event_type(), token.subscription_id())
    }

    /// Drop every subscription. Outstanding tokens stay `is_subscribed()`
    /// until released; releasing them is then a no-op.
    pub fn clear(&self) {
        self.inner.registry.clear();
    }

    /// Mode used by subscriptions that do not pick one.
    #[must_use]
    pub fn default_mode(&self) -> &PublicationMode {
        &self.inner.default_mode
    }

    /// Make `self` the process-wide hub returned by [`global`](Self::global).
    /// Can be done once per process.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if a global hub is already installed.
    pub fn install_global(&self) -> HubResult<()> {
        GLOBAL
            .set(self.clone())
            .map_err(|_| HubError::invalid("hub", "a global hub is already installed"))?;
        debug!("Global event hub installed");
        Ok(())
    }

    /// The process-wide hub, if the application installed one.
    #[must_use]
    pub fn global() -> Option<Self> {
        GLOBAL.get().cloned()
    }

    /// A handle that does not keep the hub alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakEventHub {
        WeakEventHub {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("default_mode", &self.inner.default_mode)
            .field("registry", &self.inner.registry)
            .field("main_thread", &self.inner.main_thread.is_some())
            .field("custom_schedulers", &self.inner.custom.len())
            .finish()
    }
}

/// Non-owning hub handle, for handlers that publish.
#[derive(Clone, Debug)]
pub struct WeakEventHub {
    inner: Weak<HubInner>,
}

impl WeakEventHub {
    /// The hub, if any strong handle is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventHub> {
        self.inner.upgrade().map(|inner| EventHub { inner })
    }
}

/// Builder for [`EventHub`].
pub struct EventHubBuilder {
    default_mode: PublicationMode,
    main_thread: Option<Arc<dyn Scheduler>>,
    background: Option<Arc<dyn Scheduler>>,
    background_thread_name: String,
    custom: HashMap<SchedulerTag, Arc<dyn Scheduler>>,
}

impl Default for EventHubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHubBuilder {
    /// Builder with [`PublicationMode::CallingThread`] as default mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_mode: PublicationMode::CallingThread,
            main_thread: None,
            background: None,
            background_thread_name: DEFAULT_BACKGROUND_THREAD_NAME.to_string(),
            custom: HashMap::new(),
        }
    }

    /// Mode for subscriptions that do not pick one.
    #[must_use]
    pub fn default_mode(mut self, mode: PublicationMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Scheduler for [`PublicationMode::MainThread`], e.g. an [`AffinityQueue`](crate::AffinityQueue).
    #[must_use]
    pub fn main_thread<S: Scheduler + 'static>(mut self, scheduler: Arc<S>) -> Self {
        let scheduler: Arc<dyn Scheduler> = scheduler;
        self.main_thread = Some(scheduler);
        self
    }

    /// Replace the built-in background worker. The scheduler should run jobs
    /// serially, in submission order.
    #[must_use]
    pub fn background<S: Scheduler + 'static>(mut self, scheduler: Arc<S>) -> Self {
        let scheduler: Arc<dyn Scheduler> = scheduler;
        self.background = Some(scheduler);
        self
    }

    /// Thread name for the built-in background worker.
    #[must_use]
    pub fn background_thread_name(mut self, name: impl Into<String>) -> Self {
        self.background_thread_name = name.into();
        self
    }

    /// Register a scheduler for [`PublicationMode::Custom`] with this tag.
    #[must_use]
    pub fn scheduler<S: Scheduler + 'static>(
        mut self,
        tag: impl Into<SchedulerTag>,
        scheduler: Arc<S>,
    ) -> Self {
        let scheduler: Arc<dyn Scheduler> = scheduler;
        self.custom.insert(tag.into(), scheduler);
        self
    }

    /// Build the hub.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidArgument`] if a custom scheduler tag is
    /// empty, the background thread name is empty, or the default mode names
    /// a scheduler that was not installed.
    pub fn build(self) -> HubResult<EventHub> {
        if self.custom.keys().any(|tag| tag.as_str().trim().is_empty()) {
            return Err(HubError::invalid("tag", "scheduler tags must not be empty"));
        }
        if self.background.is_none() && self.background_thread_name.trim().is_empty() {
            return Err(HubError::invalid(
                "background_thread_name",
                "thread name must not be empty",
            ));
        }

        let hub = EventHub::from_parts(
            self.default_mode,
            self.main_thread,
            self.background,
            self.background_thread_name,
            self.custom,
        );

        // The background worker is started lazily, so only check the others here.
        if *hub.default_mode() != PublicationMode::BackgroundThread {
            hub.inner.validate_mode(hub.default_mode())?;
        }

        debug!(default_mode = %hub.default_mode(), "Event hub built");
        Ok(hub)
    }
}

impl fmt::Debug for EventHubBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHubBuilder")
            .field("default_mode", &self.default_mode)
            .field("main_thread", &self.main_thread.is_some())
            .field("background", &self.background.is_some())
            .field("background_thread_name", &self.background_thread_name)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::AffinityQueue;
    use crate::token::Token;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Ping;
    struct Pong;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Ping) + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&hits);
        (hits, move |_: &Ping| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = EventHub::new();
        assert!(!hub.publish(Ping));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_weak_subscription_delivers_while_alive() {
        let hub = EventHub::new();
        let (hits, handler) = counter();
        let handler = Arc::new(handler);

        hub.subscribe(&handler).unwrap();
        assert!(hub.publish(Ping));
        assert!(hub.publish(Ping));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_weak_subscription_pruned_after_drop() {
        let hub = EventHub::new();
        let (hits, handler) = counter();
        let handler = Arc::new(handler);

        hub.subscribe(&handler).unwrap();
        assert_eq!(hub.subscriber_count::<Ping>(), 1);

        drop(handler);
        assert_eq!(hub.subscriber_count::<Ping>(), 1);
        assert!(!hub.publish(Ping));
        assert_eq!(hub.subscriber_count::<Ping>(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_token_keeps_handler_alive_until_release() {
        let hub = EventHub::new();
        let (hits, handler) = counter();

        let token = hub.subscribe_for_token(handler).unwrap();
        assert!(hub.is_registered(&token));
        assert!(hub.publish(Ping));

        token.release();
        assert!(!token.is_subscribed());
        assert!(!hub.is_registered(&token));
        assert!(!hub.publish(Ping));
        token.release();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exact_type_matching() {
        let hub = EventHub::new();
        let (ping_hits, ping_handler) = counter();
        let pong_hits = Arc::new(AtomicUsize::new(0));
        let pong_inner = Arc::clone(&pong_hits);

        let _ping = hub.subscribe_for_token(ping_handler).unwrap();
        let _pong = hub
            .subscribe_for_token(move |_: &Pong| {
                pong_inner.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        hub.publish(Ping);
        assert_eq!(ping_hits.load(Ordering::SeqCst), 1);
        assert_eq!(pong_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predicate_toggle() {
        let hub = EventHub::new();
        let (hits, handler) = counter();
        let open = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&open);

        let _token = hub
            .subscribe_for_token_with(
                handler,
                SubscribeOptions::new().predicate(move || gate.load(Ordering::SeqCst)),
            )
            .unwrap();

        assert!(!hub.publish(Ping));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        open.store(true, Ordering::SeqCst);
        assert!(hub.publish(Ping));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_main_thread_mode_requires_scheduler() {
        let hub = EventHub::new();
        let (_, handler) = counter();

        let err = hub
            .subscribe_for_token_with(
                handler,
                SubscribeOptions::new().mode(PublicationMode::MainThread),
            )
            .unwrap_err();
        assert!(matches!(err, HubError::InvalidArgument { argument: "mode", .. }));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_unknown_custom_tag_rejected() {
        let hub = EventHub::new();
        let (_, handler) = counter();

        let result = hub.subscribe_for_token_with(
            handler,
            SubscribeOptions::new().mode(PublicationMode::custom("io")),
        );
        assert!(result.is_err());
        assert!(hub.is_empty());
    }

    #[test]
    fn test_main_thread_inline_on_affinity_thread() {
        let queue = Arc::new(AffinityQueue::for_current_thread());
        let hub = EventHub::builder()
            .default_mode(PublicationMode::MainThread)
            .main_thread(Arc::clone(&queue))
            .build()
            .unwrap();
        let (hits, handler) = counter();

        let _token = hub.subscribe_for_token(handler).unwrap();
        assert!(hub.publish(Ping));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_build_rejects_default_mode_without_scheduler() {
        let err = EventHub::builder()
            .default_mode(PublicationMode::MainThread)
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "hub_invalid_argument");

        let err = EventHub::builder()
            .scheduler("", Arc::new(AffinityQueue::for_current_thread()))
            .build()
            .unwrap_err();
        assert!(matches!(err, HubError::InvalidArgument { argument: "tag", .. }));
    }

    #[test]
    fn test_custom_scheduler_receives_job() {
        let queue = Arc::new(AffinityQueue::for_current_thread());
        let hub = EventHub::builder()
            .scheduler("deferred", Arc::clone(&queue))
            .build()
            .unwrap();
        let (hits, handler) = counter();

        let _token = hub
            .subscribe_for_token_with(
                handler,
                SubscribeOptions::new().mode(PublicationMode::custom("deferred")),
            )
            .unwrap();

        // Custom schedulers are always posted to, even from their own thread.
        assert!(hub.publish(Ping));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending().unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_hub_does_not_keep_hub_alive() {
        let hub = EventHub::new();
        let weak = hub.downgrade();
        assert!(weak.upgrade().is_some());
        drop(hub);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_global_is_opt_in_and_set_once() {
        let hub = EventHub::new();
        hub.install_global().unwrap();

        let global = EventHub::global().unwrap();
        let (hits, handler) = counter();
        let _token = hub.subscribe_for_token(handler).unwrap();
        assert!(global.publish(Ping));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(EventHub::new().install_global().is_err());
    }

    #[test]
    fn test_clear_drops_everything() {
        let hub = EventHub::new();
        let (_, handler) = counter();
        let token = hub.subscribe_for_token(handler).unwrap();

        hub.clear();
        assert!(hub.is_empty());
        assert!(token.is_subscribed());
        token.release();
        assert!(!token.is_subscribed());
    }
}
