//! WebSocket bridge between the in-process [`MessageBus`] and remote
//! operators.
//!
//! Every connected client receives each bus message as one JSON text frame
//! (`{"id", "timestamp", "topic", "payload"}`). Clients publish onto the bus
//! by sending
//!
//! ```json
//! {"op": "publish", "topic": "avansict/John/command", "payload": "drive:forward:0.5"}
//! ```
//!
//! A non-string `payload` is forwarded as its compact JSON text. Any frame
//! that does not match this shape is ignored.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, warn};
use wheelbot_types::WheelbotError;

use crate::bus::MessageBus;

#[derive(Debug, Deserialize)]
struct InboundFrame {
    op: String,
    topic: String,
    payload: serde_json::Value,
}

/// Serves the bus over WebSocket.
#[derive(Clone)]
pub struct WsBridge {
    bus: MessageBus,
}

impl WsBridge {
    pub fn new(bus: MessageBus) -> Self {
        Self { bus }
    }

    /// Serve clients on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), WheelbotError> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let bridge = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = bridge.handle_client(stream, peer).await {
                            error!(peer = %peer, error = %e, "ws client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "ws accept error");
                }
            }
        }
    }

    async fn handle_client(&self, stream: TcpStream, peer: SocketAddr) -> Result<(), WheelbotError> {
        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| WheelbotError::Bus(format!("ws handshake from {peer}: {e}")))?;
        debug!(peer = %peer, "ws client connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let mut rx = self.bus.subscribe();

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(message) => {
                            let json = serde_json::to_string(&message)
                                .map_err(|e| WheelbotError::Serialization(e.to_string()))?;
                            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(peer = %peer, lagged_by = n, "ws client lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(_)) => break,
                        Some(Ok(Message::Text(text))) => {
                            self.handle_incoming_frame(text.as_str());
                        }
                        _ => {}
                    }
                }
            }
        }

        debug!(peer = %peer, "ws client disconnected");
        Ok(())
    }

    /// Publish a client frame onto the bus.
    ///
    /// Returns `true` when the frame was a well-formed publish request.
    pub(crate) fn handle_incoming_frame(&self, text: &str) -> bool {
        let Ok(frame) = serde_json::from_str::<InboundFrame>(text) else {
            return false;
        };
        if frame.op != "publish" || frame.topic.is_empty() {
            return false;
        }
        let payload = match frame.payload {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        if let Err(e) = self.bus.publish(frame.topic.as_str(), payload) {
            debug!(topic = %frame.topic, error = %e, "ws publish dropped");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::connect_async;

    fn make_bridge() -> (MessageBus, WsBridge) {
        let bus = MessageBus::default();
        let bridge = WsBridge::new(bus.clone());
        (bus, bridge)
    }

    #[tokio::test]
    async fn publish_frame_reaches_bus() {
        let (bus, bridge) = make_bridge();
        let mut sub = bus.subscribe_topic("avansict/John/command");

        let ok = bridge.handle_incoming_frame(
            r#"{"op":"publish","topic":"avansict/John/command","payload":"drive:forward:0.5"}"#,
        );
        assert!(ok);

        let message = sub.recv().await.unwrap();
        assert_eq!(message.payload, "drive:forward:0.5");
    }

    #[tokio::test]
    async fn json_payload_is_forwarded_as_text() {
        let (bus, bridge) = make_bridge();
        let mut sub = bus.subscribe_topic("t/r/x");

        assert!(bridge.handle_incoming_frame(r#"{"op":"publish","topic":"t/r/x","payload":{"a":1}}"#));
        assert_eq!(sub.recv().await.unwrap().payload, r#"{"a":1}"#);
    }

    #[test]
    fn unknown_frames_are_ignored() {
        let (bus, bridge) = make_bridge();
        let mut rx = bus.subscribe();

        assert!(!bridge.handle_incoming_frame("not json"));
        assert!(!bridge.handle_incoming_frame(r#"{"op":"subscribe","topic":"t","payload":""}"#));
        assert!(!bridge.handle_incoming_frame(r#"{"op":"publish","topic":"","payload":"x"}"#));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn client_roundtrip_over_socket() -> Result<(), Box<dyn std::error::Error>> {
        let (bus, bridge) = make_bridge();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(bridge.serve(listener));

        let (mut ws, _) = connect_async(format!("ws://{addr}")).await?;
        let mut commands = bus.subscribe_topic("avansict/John/command");

        ws.send(Message::Text(
            r#"{"op":"publish","topic":"avansict/John/command","payload":"emergency"}"#.into(),
        ))
        .await?;

        let received = tokio::time::timeout(Duration::from_secs(2), commands.recv())
            .await?
            .ok_or("bus closed")?;
        assert_eq!(received.payload, "emergency");

        // The client's own publish is echoed back as a bus frame.
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await?
            .ok_or("socket closed")??;
        let json: serde_json::Value = serde_json::from_str(frame.to_text()?)?;
        assert_eq!(json["topic"], "avansict/John/command");
        assert_eq!(json["payload"], "emergency");
        Ok(())
    }
}
