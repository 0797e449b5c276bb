// 📡 Broadcast Dispatcher
// Single consumer that fans each queued event out to every subscriber
//
// Producers (request handlers, the threshold monitor) push into an
// unbounded FIFO queue and never wait on delivery. One dispatcher task
// drains it; per event it snapshots the registry, delivers to every
// subscriber concurrently under a per-subscriber timeout, and prunes and
// closes any subscriber whose delivery failed. The next event is not
// dequeued until the current one has settled everywhere, so each
// subscriber sees events in enqueue order.

use crate::error::DeliveryError;
use crate::events::Event;
use crate::registry::{SubscriberId, SubscriberRegistry};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// EVENT QUEUE
// ============================================================================

/// Create the event queue.
///
/// Unbounded on purpose: a slow dispatcher must never hold up a request
/// handler. The cost is that a stalled dispatcher lets the backlog grow
/// without limit; per-subscriber timeouts keep that stall bounded.
pub fn event_queue() -> (EventPublisher, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventPublisher { tx }, EventQueue { rx })
}

/// Producer side. Cheap to clone; one per request-handling context.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventPublisher {
    /// Enqueue without blocking. Returns false once the dispatcher is gone.
    pub fn publish(&self, event: Event) -> bool {
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!(event = kind, "dispatcher stopped, event dropped");
                false
            }
        }
    }
}

/// Consumer side, owned by the dispatcher
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventQueue {
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Outcome of fanning out one event
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub pruned: Vec<SubscriberId>,
}

pub struct BroadcastDispatcher {
    registry: Arc<SubscriberRegistry>,
    delivery_timeout: Duration,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<SubscriberRegistry>, delivery_timeout: Duration) -> Self {
        BroadcastDispatcher {
            registry,
            delivery_timeout,
        }
    }

    /// Run the delivery loop on its own task
    pub fn spawn(self, queue: EventQueue) -> JoinHandle<()> {
        tokio::spawn(self.run(queue))
    }

    /// Drain the queue until every publisher has been dropped
    pub async fn run(self, mut queue: EventQueue) {
        info!(timeout_ms = self.delivery_timeout.as_millis() as u64, "dispatcher started");

        while let Some(event) = queue.next().await {
            self.dispatch(&event).await;
        }

        info!("dispatcher stopped: all publishers dropped");
    }

    /// Deliver one event to the current membership snapshot.
    ///
    /// Each subscriber is delivered to independently; one failing or hanging
    /// subscriber does not affect the others. A failed subscriber is
    /// unregistered and closed as soon as its own delivery settles.
    pub async fn dispatch(&self, event: &Event) -> DispatchReport {
        let subscribers = self.registry.snapshot();
        debug!(event = event.kind(), subscribers = subscribers.len(), "dispatching");

        let deliveries = subscribers.into_iter().map(|(id, subscriber)| async move {
            let outcome = match tokio::time::timeout(self.delivery_timeout, subscriber.deliver(event)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(self.delivery_timeout.as_millis() as u64)),
            };

            if let Err(e) = &outcome {
                warn!(subscriber = %id, error = %e, "delivery failed, pruning subscriber");
                self.registry.unregister(id);
                subscriber.close();
            }

            (id, outcome)
        });

        let mut report = DispatchReport::default();
        for (id, outcome) in join_all(deliveries).await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(_) => report.pruned.push(id),
            }
        }

        report
    }
}

// ============================================================================
// TESTS
// ============================================================================
