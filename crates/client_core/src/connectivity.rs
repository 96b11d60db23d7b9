//! Edge-triggered reachability flag with callback subscribers.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, Weak,
    },
};

use tracing::info;

pub type ConnectivityListener = Box<dyn Fn(bool) + Send + Sync>;

type ListenerMap = BTreeMap<u64, Arc<dyn Fn(bool) + Send + Sync>>;

struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<ListenerMap>,
}

impl Registry {
    fn remove(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}

pub struct ConnectivityMonitor {
    online: Mutex<bool>,
    registry: Arc<Registry>,
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        Self {
            online: Mutex::new(true),
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.lock().map(|guard| *guard).unwrap_or(false)
    }

    /// Records the outcome of a network call, notifying listeners only on a flip.
    ///
    /// Listeners run while the flag is held so flips are delivered in order;
    /// a listener must not report connectivity itself.
    pub fn report(&self, online: bool) {
        let Ok(mut current) = self.online.lock() else {
            return;
        };
        if *current == online {
            return;
        }
        *current = online;
        info!(online, "host connectivity changed");

        let listeners: Vec<_> = match self.registry.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(online);
        }
    }

    /// Registers `listener` for future flips; it is not called with the current state.
    pub fn subscribe(&self, listener: ConnectivityListener) -> ConnectivitySubscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.registry.listeners.lock() {
            listeners.insert(id, Arc::from(listener));
        }
        ConnectivitySubscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a listener registered until unsubscribed or dropped.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct ConnectivitySubscription {
    id: u64,
    registry: Weak<Registry>,
}

impl ConnectivitySubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for ConnectivitySubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
