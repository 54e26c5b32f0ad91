//! Handlers and destructors that call back into the hub, and concurrent use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use eventhub::{EventHub, PublicationMode, SubscribeOptions, SubscriptionToken, Token};
use eventhub_test::{DEFAULT_WAIT, Ping, Pong, Recorder, Tick, wait_until};

#[test]
fn test_handler_publishes_reply() {
    let hub = EventHub::new();
    let pongs = Recorder::<Pong>::new();
    let _pong_token = hub.subscribe_for_token(pongs.handler()).unwrap();

    let weak_hub = hub.downgrade();
    let _ping_token = hub
        .subscribe_for_token(move |ping: &Ping| {
            if let Some(hub) = weak_hub.upgrade() {
                hub.publish(ping.reply());
            }
        })
        .unwrap();

    hub.publish(Ping::new(4));
    assert_eq!(pongs.events(), vec![Pong::new(4)]);
}

#[test]
fn test_handler_subscribes_during_publish() {
    let hub = EventHub::new();
    let late = Recorder::<Tick>::new();
    let late_tokens: Arc<Mutex<Vec<SubscriptionToken>>> = Arc::new(Mutex::new(Vec::new()));

    let weak_hub = hub.downgrade();
    let recorder = late.clone();
    let tokens = Arc::clone(&late_tokens);
    let _token = hub
        .subscribe_for_token(move |_: &Tick| {
            if let Some(hub) = weak_hub.upgrade() {
                let token = hub.subscribe_for_token(recorder.handler()).unwrap();
                tokens.lock().unwrap().push(token);
            }
        })
        .unwrap();

    // The subscription added mid-publish is not part of this publish's snapshot.
    hub.publish(Tick);
    assert_eq!(late.count(), 0);

    hub.publish(Tick);
    assert_eq!(late.count(), 1);
    assert_eq!(late_tokens.lock().unwrap().len(), 2);
}

#[test]
fn test_handler_releases_own_token() {
    let hub = EventHub::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));

    let counter = Arc::clone(&calls);
    let own = Arc::clone(&slot);
    let token = hub
        .subscribe_for_token(move |_: &Ping| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = own.lock().unwrap().as_ref() {
                token.release();
            }
        })
        .unwrap();
    *slot.lock().unwrap() = Some(token);

    hub.publish(Ping::new(1));
    hub.publish(Ping::new(2));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(hub.is_empty());
}

#[test]
fn test_background_handler_releases_own_token() {
    let hub = EventHub::new();
    let pings = Recorder::<Ping>::new();
    let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));

    let recorder = pings.clone();
    let own = Arc::clone(&slot);
    let token = hub
        .subscribe_for_token_with(
            move |ping: &Ping| {
                recorder.record(ping);
                if let Some(token) = own.lock().unwrap().take() {
                    token.release();
                }
            },
            SubscribeOptions::new().mode(PublicationMode::BackgroundThread),
        )
        .unwrap();
    *slot.lock().unwrap() = Some(token);

    hub.publish(Ping::new(1));
    assert!(pings.wait_for(1, DEFAULT_WAIT));
    assert!(wait_until(DEFAULT_WAIT, || hub.is_empty()));
}

/// Handler whose destructor publishes through the hub.
struct LoudOnDrop {
    hub: EventHub,
    drops: Arc<AtomicUsize>,
}

impl Drop for LoudOnDrop {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
        self.hub.publish(Tick);
        let _ = self.hub.subscriber_count::<Tick>();
    }
}

#[test]
fn test_drop_reentering_hub_on_release() {
    let hub = EventHub::new();
    let drops = Arc::new(AtomicUsize::new(0));
    let loud = LoudOnDrop {
        hub: hub.clone(),
        drops: Arc::clone(&drops),
    };

    let token = hub
        .subscribe_for_token(move |_: &Ping| {
            let _ = &loud;
        })
        .unwrap();

    // Removing the subscription drops the handler, which publishes.
    token.release();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_reentering_hub_on_clear() {
    let hub = EventHub::new();
    let drops = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let loud = LoudOnDrop {
            hub: hub.clone(),
            drops: Arc::clone(&drops),
        };
        let token = hub
            .subscribe_for_token(move |_: &Ping| {
                let _ = &loud;
            })
            .unwrap();
        drop(token);
    }

    hub.clear();
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

#[test]
fn test_concurrent_publish_and_subscribe() {
    let hub = EventHub::new();
    let delivered = Arc::new(AtomicUsize::new(0));

    let publishers: Vec<_> = (0..4)
        .map(|_| {
            let hub = hub.clone();
            thread::spawn(move || {
                for seq in 0..500 {
                    hub.publish(Ping::new(seq));
                }
            })
        })
        .collect();

    let churners: Vec<_> = (0..4)
        .map(|_| {
            let hub = hub.clone();
            let delivered = Arc::clone(&delivered);
            thread::spawn(move || {
                for _ in 0..200 {
                    let counter = Arc::clone(&delivered);
                    let token = hub
                        .subscribe_for_token(move |_: &Ping| {
                            counter.fetch_add(1, Ordering::Relaxed);
                        })
                        .unwrap();
                    let weak = Arc::new(|_: &Ping| {});
                    hub.subscribe(&weak).unwrap();
                    token.release();
                }
            })
        })
        .collect();

    for handle in publishers.into_iter().chain(churners) {
        handle.join().unwrap();
    }

    // Tokens are all released; the dropped weak handlers go at the next publish.
    hub.publish(Ping::new(0));
    assert!(hub.is_empty());
}

#[test]
fn test_concurrent_release_is_single_effect() {
    let hub = EventHub::new();
    let token = Arc::new(hub.subscribe_for_token(|_: &Ping| {}).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let token = Arc::clone(&token);
            thread::spawn(move || token.release())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!token.is_subscribed());
    assert!(hub.is_empty());
}
