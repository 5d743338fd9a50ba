//! In-process, topic-addressed publish/subscribe bus.
//!
//! Uses a single [`tokio::sync::broadcast`] channel: every subscriber sees
//! every [`BusMessage`] and filters on the exact topic string. Topics follow
//! the `<base>/<robot>/<metric>` layout built by
//! [`TopicSet`][crate::protocol::TopicSet].
//!
//! The bus is `Clone`; all clones share the same channel. Publishing never
//! blocks, so the control thread can publish without an async runtime, and
//! [`TopicSubscriber::try_recv`] lets it drain pending commands once per tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;
use wheelbot_types::WheelbotError;

/// Default channel capacity (number of buffered messages before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// One message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    /// Opaque payload, usually a JSON record or a raw command string.
    pub payload: String,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Shared message bus. Clone it cheaply.
#[derive(Clone, Debug)]
pub struct MessageBus {
    sender: broadcast::Sender<BusMessage>,
}

impl MessageBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish `payload` on `topic`.
    ///
    /// Returns the number of subscribers handed the message.
    ///
    /// # Errors
    ///
    /// Returns [`WheelbotError::Bus`] when nobody is subscribed. Callers on
    /// the control path log this and carry on.
    pub fn publish(
        &self,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<usize, WheelbotError> {
        self.publish_message(BusMessage::new(topic, payload))
    }

    /// Publish a pre-built message, keeping its id and timestamp.
    pub fn publish_message(&self, message: BusMessage) -> Result<usize, WheelbotError> {
        let topic = message.topic.clone();
        self.sender
            .send(message)
            .map_err(|_| WheelbotError::Bus(format!("no subscribers for topic {topic}")))
    }

    /// Subscribe to every message regardless of topic.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Subscribe to messages whose topic equals `topic` exactly.
    pub fn subscribe_topic(&self, topic: impl Into<String>) -> TopicSubscriber {
        TopicSubscriber {
            topic: topic.into(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Current number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Topic subscriber
// ────────────────────────────────────────────────────────────────────────────

/// A receiver that only yields messages on one topic.
pub struct TopicSubscriber {
    topic: String,
    receiver: broadcast::Receiver<BusMessage>,
}

impl TopicSubscriber {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message on this topic.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.topic == self.topic => return Some(message),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = %self.topic, lagged_by = n, "TopicSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next already-queued message on this topic without waiting.
    ///
    /// Messages on other topics are skipped. Returns `None` when the queue is
    /// empty or the bus is closed.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if message.topic == self.topic => return Some(message),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = %self.topic, lagged_by = n, "TopicSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every queued message on this topic.
    pub fn drain(&mut self) -> Vec<BusMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = MessageBus::default();
        let mut rx = bus.subscribe();

        bus.publish("avansict/John/state", "{}")?;

        let received = rx.recv().await?;
        assert_eq!(received.topic, "avansict/John/state");
        assert_eq!(received.payload, "{}");
        Ok(())
    }

    #[tokio::test]
    async fn topic_subscriber_matches_exact_topic() -> Result<(), Box<dyn std::error::Error>> {
        let bus = MessageBus::default();
        let mut sub = bus.subscribe_topic("avansict/John/command");

        bus.publish("avansict/John/commander", "nope")?;
        bus.publish("avansict/John/command", "drive:forward:0.5")?;

        let received = sub.recv().await.ok_or("no message received")?;
        assert_eq!(received.payload, "drive:forward:0.5");
        Ok(())
    }

    #[test]
    fn try_recv_drains_without_blocking() {
        let bus = MessageBus::default();
        let mut sub = bus.subscribe_topic("t/r/command");

        assert!(sub.try_recv().is_none());

        bus.publish("t/r/state", "x").unwrap();
        bus.publish("t/r/command", "a").unwrap();
        bus.publish("t/r/command", "b").unwrap();

        let drained: Vec<_> = sub.drain().into_iter().map(|m| m.payload).collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = MessageBus::default();
        let result = bus.publish("t/r/state", "{}");
        assert!(matches!(result, Err(WheelbotError::Bus(_))));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_message() -> Result<(), Box<dyn std::error::Error>> {
        let bus = MessageBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let message = BusMessage::new("t/r/line", "{}");
        bus.publish_message(message.clone())?;

        assert_eq!(rx1.recv().await?.id, message.id);
        assert_eq!(rx2.recv().await?.id, message.id);
        Ok(())
    }

    #[test]
    fn slow_subscriber_skips_lagged_messages() {
        let bus = MessageBus::new(4);
        let mut sub = bus.subscribe_topic("t/r/command");

        for i in 0..10 {
            bus.publish("t/r/command", format!("m{i}")).unwrap();
        }

        // Only the newest `capacity` messages survive.
        let drained: Vec<_> = sub.drain().into_iter().map(|m| m.payload).collect();
        assert_eq!(drained, vec!["m6", "m7", "m8", "m9"]);
    }
}
