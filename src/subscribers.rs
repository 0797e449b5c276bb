// 📬 In-process subscribers
// Observers that live inside the process rather than behind a socket

use crate::error::DeliveryError;
use crate::events::Event;
use crate::registry::Subscriber;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Forwards each event into a bounded tokio channel. A full channel makes
/// delivery wait (and eventually time out); a dropped receiver fails
/// delivery immediately.
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Event>,
}

impl ChannelSubscriber {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSubscriber { tx }, rx)
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| DeliveryError::Closed)
    }
}
