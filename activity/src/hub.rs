use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::warn;

use crate::event::ActivityEvent;

/// Handle identifying one registered observer.
pub type ObserverId = u64;

/// Registry of live observers with best-effort broadcast.
///
/// Thread-safe: all methods can be called concurrently. Observers may
/// connect and disconnect while a broadcast is in flight; the broadcast
/// works on a snapshot of the registry and never mutates it mid-iteration.
pub struct ActivityHub {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<ActivityEvent>>>,
    next_id: AtomicU64,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers the send half of an observer channel and returns its id.
    ///
    /// Registering the same sender twice yields two ids; the duplicate only
    /// risks redundant delivery, never lost events.
    pub fn register(&self, tx: mpsc::Sender<ActivityEvent>) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.write().insert(id, tx);
        id
    }

    /// Builds a bounded channel of `capacity` and registers its send half.
    ///
    /// The transport keeps the receiver; dropping it counts as a disconnect
    /// and the observer is unregistered on the next broadcast.
    pub fn connect(&self, capacity: usize) -> (ObserverId, mpsc::Receiver<ActivityEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (self.register(tx), rx)
    }

    /// Removes an observer. Returns false when it was already gone.
    pub fn unregister(&self, id: ObserverId) -> bool {
        self.observers.write().remove(&id).is_some()
    }

    /// Number of currently registered observers.
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Delivers `event` to every registered observer and returns how many
    /// deliveries succeeded.
    ///
    /// Delivery is isolated per observer: `try_send` never blocks, so a
    /// full buffer or a dropped receiver costs that observer its
    /// registration and nothing else. Failures never propagate to the
    /// caller. Each observer sees events in the order `broadcast` was
    /// called for it; there is no ordering across observers.
    pub fn broadcast(&self, event: &ActivityEvent) -> usize {
        let snapshot: Vec<(ObserverId, mpsc::Sender<ActivityEvent>)> = {
            let observers = self.observers.read();
            observers.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("dropping observer {}: {}", id, e);
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut observers = self.observers.write();
            for id in failed {
                observers.remove(&id);
            }
        }

        delivered
    }
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new()
    }
}
