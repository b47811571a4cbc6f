//! The location store.
//!
//! Holds exactly one current [`Location`]. Writers replace it wholesale;
//! every replacement is delivered to each subscriber exactly once, in
//! subscription order. The store owns the key generator so that keys are
//! unique per store rather than per process.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::location::{Location, INITIAL_KEY};

/// Handle returned by [`LocationStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Location) + Send + Sync>;

pub struct LocationStore {
    current: ArcSwap<Location>,
    next_key: AtomicU64,
    next_subscription: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl fmt::Debug for LocationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationStore")
            .field("current", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LocationStore {
    /// Create a store. The initial location's key is forced to
    /// [`INITIAL_KEY`].
    pub fn new(mut initial: Location) -> Self {
        initial.key = INITIAL_KEY.to_string();
        Self {
            current: ArcSwap::from_pointee(initial),
            next_key: AtomicU64::new(1),
            next_subscription: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current location.
    pub fn get(&self) -> Arc<Location> {
        self.current.load_full()
    }

    /// Replace the current location and notify every subscriber once.
    ///
    /// When a subscriber replaces the location again while being notified,
    /// delivery of the older location stops, so every subscriber's last
    /// delivery matches [`LocationStore::get`].
    pub fn set(&self, location: Location) {
        tracing::debug!(
            pathname = %location.pathname,
            key = %location.key,
            "Location updated"
        );
        let location = Arc::new(location);
        self.current.store(location.clone());

        // Snapshot so listeners may (un)subscribe while being notified.
        let listeners: Vec<Listener> = self
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            // A listener may set again (a redirect). That nested set has
            // already reached every listener with the newer location.
            if !Arc::ptr_eq(&*self.current.load(), &location) {
                tracing::debug!(
                    pathname = %location.pathname,
                    "Location superseded during notification"
                );
                break;
            }
            listener(&location);
        }
    }

    /// Fresh key, never equal to a previous one from this store.
    pub fn next_key(&self) -> String {
        format!("k{}", self.next_key.fetch_add(1, Ordering::Relaxed))
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Location) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
