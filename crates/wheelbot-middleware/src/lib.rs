//! `wheelbot-middleware` – bus plumbing between the robot and its operators.
//!
//! # Modules
//!
//! - [`bus`] – in-process topic bus built on a Tokio broadcast channel.
//! - [`protocol`] – command wire format and `<base>/<robot>/<metric>` topics.
//! - [`comms`] – the robot's rate-limited link to the bus.
//! - [`ws_bridge`] – WebSocket server exposing the bus to remote clients.

pub mod bus;
pub mod comms;
pub mod protocol;
pub mod ws_bridge;

pub use bus::{BusMessage, MessageBus, TopicSubscriber};
pub use comms::Communication;
pub use protocol::{Metric, ParseError, TopicSet, parse_command};
pub use ws_bridge::WsBridge;
