//! Subscriber registry and fan-out.
//!
//! Each asset class keeps an ordered list of callbacks. A fan-out builds one
//! shared snapshot and hands it to every callback that is still registered.
//!
//! Delivery rules:
//! - The subscriber list is copied before iterating, and no lock is held while a
//!   callback runs, so callbacks may subscribe or unsubscribe re-entrantly.
//! - Every subscriber carries a liveness flag that is checked right before it is
//!   invoked; a subscriber removed halfway through a fan-out is never called.
//! - Snapshots are tagged with the class generation. A subscriber only ever sees
//!   strictly increasing generations, so the snapshot handed over at subscribe
//!   time can never overwrite a newer tick that raced ahead of it.
//! - Deliveries to one subscriber are serialized: the generation check and the
//!   callback run under that subscriber's own lock. A callback must therefore not
//!   trigger a synchronous fan-out of its own class.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::debug;
use market_common::{AssetClass, AssetRecord};

/// Immutable view of one class's records at a point in time.
pub type Snapshot = Arc<[AssetRecord]>;

type Callback = Box<dyn Fn(Snapshot) + Send + Sync>;

struct Subscriber {
    id: u64,
    active: AtomicBool,
    delivered: Mutex<u64>,
    callback: Callback,
}

impl Subscriber {
    fn deliver(&self, generation: u64, snapshot: &Snapshot) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if *delivered >= generation || !self.active.load(Ordering::Acquire) {
            return false;
        }
        *delivered = generation;
        (self.callback)(Arc::clone(snapshot));
        true
    }
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    classes: Mutex<HashMap<AssetClass, Vec<Arc<Subscriber>>>>,
}

impl RegistryInner {
    fn remove(&self, class: AssetClass, id: u64) {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = classes.get_mut(&class) {
            list.retain(|s| s.id != id);
        }
    }
}

/// Per-class set of callback subscribers.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the subscribers of `class`.
    ///
    /// Nothing is delivered here; see [`Subscription::deliver_initial`].
    pub fn register<F>(&self, class: AssetClass, callback: F) -> Subscription
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            active: AtomicBool::new(true),
            delivered: Mutex::new(0),
            callback: Box::new(callback),
        });
        let count = {
            let mut classes = self
                .inner
                .classes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let list = classes.entry(class).or_default();
            list.push(Arc::clone(&subscriber));
            list.len()
        };
        debug!("Subscriber {} added to {}. Total: {}", id, class, count);
        Subscription {
            class,
            subscriber,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `snapshot` to every live subscriber of `class` in registration order.
    ///
    /// Returns how many callbacks were invoked.
    pub fn notify(&self, class: AssetClass, generation: u64, snapshot: &Snapshot) -> usize {
        let targets: Vec<Arc<Subscriber>> = {
            let classes = self
                .inner
                .classes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            classes.get(&class).cloned().unwrap_or_default()
        };
        targets
            .iter()
            .filter(|subscriber| subscriber.deliver(generation, snapshot))
            .count()
    }

    /// Number of live subscribers of `class`.
    pub fn len(&self, class: AssetClass) -> usize {
        let classes = self
            .inner
            .classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        classes.get(&class).map_or(0, Vec::len)
    }

    /// `true` when `class` has no subscribers.
    pub fn is_empty(&self, class: AssetClass) -> bool {
        self.len(class) == 0
    }
}

/// Handle of one registration. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    class: AssetClass,
    subscriber: Arc<Subscriber>,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Asset class this subscription listens to.
    pub fn class(&self) -> AssetClass {
        self.class
    }

    /// `false` once unsubscribed.
    pub fn is_active(&self) -> bool {
        self.subscriber.active.load(Ordering::Acquire)
    }

    /// Hands the subscriber the snapshot current at subscribe time.
    ///
    /// Skipped when a newer generation already reached it.
    pub fn deliver_initial(&self, generation: u64, snapshot: &Snapshot) -> bool {
        self.subscriber.deliver(generation, snapshot)
    }

    /// Stops deliveries and removes the registration. Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        if !self.subscriber.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.class, self.subscriber.id);
        }
        debug!("Subscriber {} removed from {}", self.subscriber.id, self.class);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("class", &self.class)
            .field("id", &self.subscriber.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
