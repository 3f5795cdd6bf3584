//! Subscription fan-out: per-view change notification.
//!
//! Each view registers interest in a `(kind, predicate)` pair and is
//! called back only when the query result for that predicate actually
//! changes, compared by value against the previously delivered result --
//! a poll that re-states known state causes no redundant re-render.
//!
//! Subscriptions are scoped: the returned [`SubscriptionGuard`]
//! unregisters on drop, on every exit path, so a torn-down view cannot
//! leak its callback.
//!
//! Delivery is two-phase: changed results are collected while the caller
//! still holds its store borrow, and callbacks run only after it is
//! released. Callbacks may therefore re-enter the session freely --
//! query, subscribe, drop guards, or feed new data in.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use concierge_core::{EntityKind, Record};

use crate::store::ReconciledStore;

type Predicate = Box<dyn Fn(&Record) -> bool>;
type Callback = Box<dyn FnMut(&[Record])>;

struct Subscription {
    kind: EntityKind,
    predicate: Predicate,
    callback: Callback,
    last: Vec<Record>,
}

#[derive(Default)]
struct Registry {
    subscriptions: BTreeMap<u64, Subscription>,
    /// Guards dropped while a delivery had their subscription checked
    /// out; purged when the delivery returns.
    dropped: BTreeSet<u64>,
    next_id: u64,
}

/// Notifies each interested view of store changes affecting only the
/// records it displays.
pub struct Fanout {
    registry: Rc<RefCell<Registry>>,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

impl Fanout {
    pub fn new() -> Self {
        Fanout {
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// Register a view's interest. The current query result seeds the
    /// comparison baseline; the first callback fires on the first actual
    /// change after registration.
    pub fn subscribe(
        &self,
        store: &ReconciledStore,
        kind: EntityKind,
        predicate: impl Fn(&Record) -> bool + 'static,
        callback: impl FnMut(&[Record]) + 'static,
    ) -> SubscriptionGuard {
        let last = store.query(kind, &predicate);
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscriptions.insert(
            id,
            Subscription {
                kind,
                predicate: Box::new(predicate),
                callback: Box::new(callback),
                last,
            },
        );
        SubscriptionGuard {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Phase one: recompute every subscription's query against the store,
    /// update the comparison baselines, and return the deliveries whose
    /// result changed. No callbacks run here, so the caller may hold a
    /// store borrow.
    pub fn collect(&self, store: &ReconciledStore) -> Vec<(u64, Vec<Record>)> {
        let mut registry = self.registry.borrow_mut();
        let mut batch = Vec::new();
        for (id, subscription) in registry.subscriptions.iter_mut() {
            let result = store.query(subscription.kind, &subscription.predicate);
            if result != subscription.last {
                subscription.last = result.clone();
                batch.push((*id, result));
            }
        }
        batch
    }

    /// Phase two: run the callbacks of one collected batch. Callbacks may
    /// re-enter the session and the fan-out (subscribe, drop guards).
    pub fn deliver(&self, batch: Vec<(u64, Vec<Record>)>) {
        for (id, records) in batch {
            // Check the subscription out so the callback can re-enter
            // without a double borrow; absent means the guard was dropped
            // after the batch was collected.
            let checked_out = self.registry.borrow_mut().subscriptions.remove(&id);
            let Some(mut subscription) = checked_out else {
                continue;
            };
            (subscription.callback)(&records);
            let mut registry = self.registry.borrow_mut();
            if !registry.dropped.remove(&id) {
                registry.subscriptions.insert(id, subscription);
            }
        }
    }

    /// Recompute every subscription's query and deliver the ones whose
    /// result changed, for callers holding no store borrow.
    pub fn notify(&self, store: &ReconciledStore) {
        let batch = self.collect(store);
        self.deliver(batch);
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.borrow().subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped handle for one subscription; unregisters on drop.
#[must_use = "dropping the guard immediately cancels the subscription"]
pub struct SubscriptionGuard {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.borrow_mut();
            if registry.subscriptions.remove(&self.id).is_none() {
                // Checked out by a notification pass in progress; mark it
                // so the merge discards it.
                registry.dropped.insert(self.id);
            }
        }
    }
}
