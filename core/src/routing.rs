//! Observable state behind the routing overlay.
//!
//! # Design
//! `RoutingStore` is a cheap, cloneable handle; every clone sees the same
//! value. Writers replace or derive the value, then each subscriber is called
//! synchronously, in subscription order. The lock is released before callbacks
//! run, so a callback may read or write the store. A write made while
//! notifications are in flight is queued and delivered once the current round
//! reaches every subscriber, so each subscriber sees values in write order and
//! ends on the one `get` returns.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair. Values are not range checked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// What the routing overlay shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutingState {
    pub is_visible: bool,
    pub destination: String,
    #[serde(rename = "lngLat")]
    pub target: LngLat,
}

type Callback = Arc<dyn Fn(&RoutingState) + Send + Sync>;

struct Inner {
    value: RoutingState,
    subscribers: Vec<(u64, Callback)>,
    next_id: u64,
    /// Values written but not yet delivered.
    pending: VecDeque<RoutingState>,
    /// Set while some caller is draining `pending`.
    notifying: bool,
}

/// Shared handle to the routing overlay state.
#[derive(Clone)]
pub struct RoutingStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for RoutingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoutingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RoutingStore")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl RoutingStore {
    pub fn new() -> Self {
        Self::with_state(RoutingState::default())
    }

    pub fn with_state(value: RoutingState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                subscribers: Vec::new(),
                next_id: 0,
                pending: VecDeque::new(),
                notifying: false,
            })),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> RoutingState {
        self.inner.lock().value.clone()
    }

    /// Register `callback`. It receives the current value right away, then
    /// every new value until the returned guard is dropped.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&RoutingState) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let (id, current) = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Arc::clone(&callback)));
            (id, inner.value.clone())
        };
        callback(&current);
        Subscription {
            store: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Replace the whole value and notify subscribers.
    pub fn set(&self, value: RoutingState) {
        self.update(|state| *state = value);
    }

    /// Derive the new value from the current one and notify subscribers.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RoutingState),
    {
        {
            let mut inner = self.inner.lock();
            f(&mut inner.value);
            let value = inner.value.clone();
            inner.pending.push_back(value);
            if inner.notifying {
                return;
            }
            inner.notifying = true;
        }

        let _drain = DrainGuard(&self.inner);
        loop {
            let (value, subscribers) = {
                let mut inner = self.inner.lock();
                let Some(value) = inner.pending.pop_front() else {
                    break;
                };
                let subscribers: Vec<Callback> =
                    inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
                (value, subscribers)
            };
            for callback in subscribers {
                callback(&value);
            }
        }
    }

    /// Show the overlay pointing at `destination`.
    pub fn show(&self, destination: impl Into<String>, target: LngLat) {
        let destination = destination.into();
        self.update(|state| {
            state.is_visible = true;
            state.destination = destination;
            state.target = target;
        });
    }

    /// Hide the overlay, keeping the last destination.
    pub fn hide(&self) {
        self.update(|state| state.is_visible = false);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// Ends a drain round, even if a callback panics.
struct DrainGuard<'a>(&'a Mutex<Inner>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.0.lock();
        inner.notifying = false;
        inner.pending.clear();
    }
}

/// Keeps a `RoutingStore` callback registered while alive.
pub struct Subscription {
    store: std::sync::Weak<Mutex<Inner>>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Leave the callback registered for as long as the store lives.
    pub fn detach(mut self) {
        self.id = None;
    }

    fn remove(&mut self) {
        let Some(id) = self.id.take() else { return };
        if let Some(inner) = self.store.upgrade() {
            inner.lock().subscribers.retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<RoutingState>>>, impl Fn(&RoutingState) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |state: &RoutingState| sink.lock().push(state.clone()))
    }

    fn gare() -> RoutingState {
        RoutingState {
            is_visible: true,
            destination: "Gare".to_string(),
            target: LngLat::new(2.35, 48.85),
        }
    }

    #[test]
    fn default_state_is_hidden_at_origin() {
        let store = RoutingStore::new();
        assert_eq!(
            store.get(),
            RoutingState {
                is_visible: false,
                destination: String::new(),
                target: LngLat { lng: 0.0, lat: 0.0 },
            }
        );
    }

    #[test]
    fn set_then_get_returns_value_and_notifies_once() {
        let store = RoutingStore::new();
        let (first, cb1) = recorder();
        let (second, cb2) = recorder();
        let _s1 = store.subscribe(cb1);
        let _s2 = store.subscribe(cb2);

        store.set(gare());

        assert_eq!(store.get(), gare());
        for seen in [first, second] {
            let seen = seen.lock();
            assert_eq!(seen.iter().filter(|s| **s == gare()).count(), 1);
            assert_eq!(seen.last(), Some(&gare()));
        }
    }

    #[test]
    fn subscribe_delivers_current_value_first() {
        let store = RoutingStore::with_state(gare());
        let (seen, cb) = recorder();
        let _sub = store.subscribe(cb);
        assert_eq!(*seen.lock(), vec![gare()]);
    }

    #[test]
    fn subscribers_are_called_in_subscription_order() {
        let store = RoutingStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                store.subscribe(move |_| order.lock().push(i))
            })
            .collect();
        order.lock().clear();

        store.hide();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = RoutingStore::new();
        let (seen, cb) = recorder();
        let sub = store.subscribe(cb);
        store.show("Mairie", LngLat::new(1.0, 2.0));
        sub.unsubscribe();
        store.hide();

        assert_eq!(seen.lock().len(), 2);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_guard_unsubscribes() {
        let store = RoutingStore::new();
        {
            let _sub = store.subscribe(|_| {});
            assert_eq!(store.subscriber_count(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn detached_subscription_keeps_receiving() {
        let store = RoutingStore::new();
        let (seen, cb) = recorder();
        store.subscribe(cb).detach();
        store.set(gare());
        assert_eq!(seen.lock().last(), Some(&gare()));
    }

    #[test]
    fn update_derives_from_previous_value() {
        let store = RoutingStore::with_state(gare());
        store.update(|state| state.destination.push_str(" du Nord"));
        let state = store.get();
        assert_eq!(state.destination, "Gare du Nord");
        assert!(state.is_visible);
    }

    #[test]
    fn hide_keeps_destination() {
        let store = RoutingStore::new();
        store.show("Gare", LngLat::new(2.35, 48.85));
        store.hide();
        let state = store.get();
        assert!(!state.is_visible);
        assert_eq!(state.destination, "Gare");
        assert_eq!(state.target, LngLat::new(2.35, 48.85));
    }

    #[test]
    fn visibility_and_destination_are_independent() {
        let store = RoutingStore::new();
        store.update(|state| state.is_visible = true);
        assert!(store.get().is_visible);
        assert!(store.get().destination.is_empty());
    }

    #[test]
    fn callback_can_read_the_store() {
        let store = RoutingStore::new();
        let reader = store.clone();
        let (seen, _) = recorder();
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |_| sink.lock().push(reader.get()));
        store.set(gare());
        assert_eq!(seen.lock().last(), Some(&gare()));
    }

    #[test]
    fn write_from_a_callback_reaches_later_subscribers_in_order() {
        let store = RoutingStore::new();
        let writer = store.clone();
        let _hider = store.subscribe(move |state| {
            if state.is_visible {
                writer.hide();
            }
        });
        let (seen, cb) = recorder();
        let _watcher = store.subscribe(cb);

        store.show("Gare", LngLat::new(2.35, 48.85));

        let state = store.get();
        assert!(!state.is_visible);
        let seen = seen.lock();
        let visibility: Vec<bool> = seen.iter().map(|s| s.is_visible).collect();
        assert_eq!(visibility, vec![false, true, false]);
        assert_eq!(seen.last(), Some(&state));
    }

    #[test]
    fn panicking_callback_does_not_wedge_the_store() {
        let store = RoutingStore::new();
        let sub = store.subscribe(|state| {
            if state.destination == "boom" {
                panic!("callback failure");
            }
        });
        let writer = store.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            writer.show("boom", LngLat::default())
        }));
        assert!(result.is_err());
        sub.unsubscribe();

        let (seen, cb) = recorder();
        let _sub = store.subscribe(cb);
        store.set(gare());
        assert_eq!(seen.lock().last(), Some(&gare()));
    }

    #[test]
    fn clones_share_the_value() {
        let store = RoutingStore::new();
        let other = store.clone();
        other.set(gare());
        assert_eq!(store.get(), gare());
    }

    #[test]
    fn out_of_range_coordinates_are_accepted() {
        let store = RoutingStore::new();
        store.show("Nowhere", LngLat::new(540.0, -123.0));
        assert_eq!(store.get().target, LngLat::new(540.0, -123.0));
    }

    #[test]
    fn serializes_for_the_ui() {
        let json = serde_json::to_value(gare()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isVisible": true,
                "destination": "Gare",
                "lngLat": {"lng": 2.35, "lat": 48.85}
            })
        );
    }
}
