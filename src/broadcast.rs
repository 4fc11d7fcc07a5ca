//! "Data changed" notifications between live views.
//!
//! Delivery is synchronous and best effort: listeners registered when
//! [`ChangeBus::publish`] runs are called in registration order, nothing is
//! queued for listeners that subscribe later.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Name the desktop shell emits same-page changes under.
pub const DATA_CHANGED_EVENT: &str = "employeeDataChanged";
/// Name the desktop shell emits storage-level changes under.
pub const STORAGE_EVENT: &str = "storage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChangeEvent {
    /// A mutation in this process finished.
    DataChanged,
    /// The stored value under `key` changed underneath us.
    StorageChanged { key: String },
}

impl ChangeEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ChangeEvent::DataChanged => DATA_CHANGED_EVENT,
            ChangeEvent::StorageChanged { .. } => STORAGE_EVENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
pub struct ChangeBus {
    next_token: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionToken, Listener)>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionToken
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((token, Arc::new(listener)));
        token
    }

    /// Returns false when the token was already gone.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != token);
        listeners.len() != before
    }

    /// Calls every current listener and returns how many were notified.
    /// The listener list is copied first, so a listener may subscribe or
    /// unsubscribe without deadlocking.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Unsubscribes when dropped.
#[derive(Debug)]
pub struct Subscription {
    bus: Arc<ChangeBus>,
    token: SubscriptionToken,
}

impl Subscription {
    pub fn new<F>(bus: &Arc<ChangeBus>, listener: F) -> Self
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let token = bus.subscribe(listener);
        Self {
            bus: Arc::clone(bus),
            token,
        }
    }

    pub fn token(&self) -> SubscriptionToken {
        self.token
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn publishes_to_current_listeners_only() {
        let bus = ChangeBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let token = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.publish(&ChangeEvent::DataChanged), 1);
        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        assert_eq!(bus.publish(&ChangeEvent::DataChanged), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_see_the_event() {
        let bus = ChangeBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        bus.publish(&ChangeEvent::StorageChanged {
            key: "employees".to_string(),
        });
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[ChangeEvent::StorageChanged {
                key: "employees".to_string()
            }]
        );
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let bus = Arc::new(ChangeBus::new());
        let subscription = Subscription::new(&bus, |_| {});
        assert_eq!(bus.listener_count(), 1);
        drop(subscription);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn event_names_match_the_frontend() {
        assert_eq!(ChangeEvent::DataChanged.event_name(), "employeeDataChanged");
        let payload = serde_json::to_value(ChangeEvent::StorageChanged {
            key: "employees".to_string(),
        })
        .unwrap();
        assert_eq!(payload["kind"], "storageChanged");
        assert_eq!(payload["key"], "employees");
    }
}
