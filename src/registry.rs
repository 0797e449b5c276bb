// 👥 Subscriber Registry
// Membership set of connected observers, independent of the ledger lock

use crate::error::DeliveryError;
use crate::events::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// SUBSCRIBER
// ============================================================================

/// An observer's outbound channel. Implemented by the transport
/// (a WebSocket, an in-process channel, ...).
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Deliver one event. Any error marks the subscriber as dead.
    async fn deliver(&self, event: &Event) -> Result<(), DeliveryError>;

    /// Tear down the transport after the subscriber has been pruned.
    /// Must not block.
    fn close(&self) {}
}

/// Opaque handle identifying one registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        SubscriberId(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Thread-safe set of subscribers. The lock is only held to copy or edit
/// membership, never across delivery I/O.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber under a fresh handle
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        let count = {
            let mut subscribers = self.lock();
            subscribers.insert(id, subscriber);
            subscribers.len()
        };

        info!(subscriber = %id, subscribers = count, "subscriber registered");
        id
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.lock();
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };

        if removed {
            info!(subscriber = %id, subscribers = count, "subscriber unregistered");
        }
        removed
    }

    /// Point-in-time copy of membership for iteration outside the lock
    pub fn snapshot(&self) -> Vec<(SubscriberId, Arc<dyn Subscriber>)> {
        self.lock()
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Arc<dyn Subscriber>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(_) => {
                error!("subscriber registry lock poisoned");
                panic!("subscriber registry lock poisoned");
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSubscriber;

    #[async_trait]
    impl Subscriber for NullSubscriber {
        async fn deliver(&self, _event: &Event) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = SubscriberRegistry::new();
        assert!(registry.is_empty());

        let a = registry.register(Arc::new(NullSubscriber));
        let b = registry.register(Arc::new(NullSubscriber));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a));

        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        assert!(!registry.contains(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_changes() {
        let registry = SubscriberRegistry::new();
        let a = registry.register(Arc::new(NullSubscriber));

        let snapshot = registry.snapshot();
        registry.register(Arc::new(NullSubscriber));
        registry.unregister(a);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, a);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(SubscriberRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(Arc::new(NullSubscriber)))
            })
            .collect();

        let ids: Vec<SubscriberId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 16);
        for id in ids {
            assert!(registry.unregister(id));
        }
        assert!(registry.is_empty());
    }
}
