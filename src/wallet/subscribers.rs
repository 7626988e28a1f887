use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use crate::models::ConnectionState;

/// Callback receiving a state snapshot after every change
pub type StateCallback = Arc<dyn Fn(&ConnectionState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: HashMap<u64, StateCallback>,
}

/// Snapshots waiting to be delivered, oldest first
#[derive(Default)]
struct Outbox {
    queue: VecDeque<ConnectionState>,
    draining: bool,
}

/// Set of state subscribers owned by the manager
#[derive(Clone, Default)]
pub(crate) struct SubscriberSet {
    inner: Arc<Mutex<Registry>>,
    outbox: Arc<Mutex<Outbox>>,
}

impl SubscriberSet {
    pub fn subscribe(&self, callback: StateCallback) -> Subscription {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, callback);
        debug!("Added state subscriber {} ({} total)", id, registry.callbacks.len());

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Queue a snapshot for delivery. Callers enqueue while still holding the
    /// lock that produced the snapshot, so queue order is mutation order.
    pub fn enqueue(&self, state: ConnectionState) {
        lock(&self.outbox).queue.push_back(state);
    }

    /// Deliver queued snapshots in order. Only one thread drains at a time;
    /// a caller that finds a drain in progress (another thread, or a callback
    /// re-entering the manager) leaves its snapshot to that drainer.
    pub fn flush(&self) {
        {
            let mut outbox = lock(&self.outbox);
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }

        let mut drain = DrainGuard { outbox: &self.outbox, finished: false };
        loop {
            let next = {
                let mut outbox = lock(&self.outbox);
                match outbox.queue.pop_front() {
                    Some(state) => state,
                    None => {
                        // Cleared under the same lock that saw the queue empty
                        outbox.draining = false;
                        drain.finished = true;
                        return;
                    }
                }
            };
            self.notify(&next);
        }
    }

    /// Queue and deliver in one step
    pub fn publish(&self, state: ConnectionState) {
        self.enqueue(state);
        self.flush();
    }

    /// Hand `state` to the subscribers registered at call time.
    /// Callbacks run without any lock held.
    fn notify(&self, state: &ConnectionState) {
        let callbacks: Vec<StateCallback> = lock(&self.inner).callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(state);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).callbacks.len()
    }
}

/// Clears the draining flag if a callback panics mid-drain
struct DrainGuard<'a> {
    outbox: &'a Mutex<Outbox>,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.outbox).draining = false;
        }
    }
}

/// Capability to remove one subscriber. Dropping it keeps the subscription.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the callback. Returns false if the manager is already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => {
                let removed = lock(&registry).callbacks.remove(&self.id).is_some();
                debug!("Removed state subscriber {}", self.id);
                removed
            }
            None => false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
