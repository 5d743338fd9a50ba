//! The robot's single link to the message bus.
//!
//! [`Communication`] subscribes to the robot's command topic at construction
//! and is polled from the control thread: [`Communication::poll_commands`]
//! drains and parses everything queued since the previous tick, and the
//! `publish_*` methods serialize telemetry records and push them onto the
//! per-metric topics.
//!
//! Every outbound stream owns a [`governor`] limiter with a burst of one:
//! state, alert and message at the status interval, the sensor streams at
//! the data interval. A publish before the stream's interval has elapsed is
//! dropped silently. Bus failures are logged and never reach the caller.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use tracing::debug;
use wheelbot_types::config::CommunicationConfiguration;
use wheelbot_types::telemetry::{
    AlertRecord, ColorRecord, LineRecord, MeasurementRecord, MessageRecord, ObstacleRecord,
    StateRecord,
};
use wheelbot_types::{Command, WheelbotError};

use crate::bus::{MessageBus, TopicSubscriber};
use crate::protocol::{Metric, TopicSet, parse_command};

/// Outbound metrics that are rate-limited.
const STATUS_STREAMS: [Metric; 3] = [Metric::State, Metric::Alert, Metric::Message];
const DATA_STREAMS: [Metric; 5] = [
    Metric::Obstacles,
    Metric::Line,
    Metric::Color,
    Metric::Temperature,
    Metric::Humidity,
];

pub struct Communication {
    bus: MessageBus,
    topics: TopicSet,
    commands: TopicSubscriber,
    limiters: HashMap<Metric, DefaultDirectRateLimiter>,
}

impl Communication {
    /// Subscribe to `<base>/<robot>/command` and set up one limiter per stream.
    ///
    /// # Errors
    ///
    /// Returns [`WheelbotError::InvalidConfig`] when a publish interval is zero.
    pub fn new(
        bus: MessageBus,
        robot_name: &str,
        config: &CommunicationConfiguration,
    ) -> Result<Self, WheelbotError> {
        let topics = TopicSet::new(&config.base_topic, robot_name);
        let status = quota(config.status_publish_interval_ms)?;
        let data = quota(config.data_publish_interval_ms)?;

        let mut limiters = HashMap::new();
        for metric in STATUS_STREAMS {
            limiters.insert(metric, RateLimiter::direct(status));
        }
        for metric in DATA_STREAMS {
            limiters.insert(metric, RateLimiter::direct(data));
        }

        let commands = bus.subscribe_topic(topics.command());
        debug!(topic = %commands.topic(), "subscribed to command topic");
        Ok(Self {
            bus,
            topics,
            commands,
            limiters,
        })
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    // ── Inbound ─────────────────────────────────────────────────────────────

    /// Drain and parse every command received since the last call.
    ///
    /// Malformed commands are dropped and logged at debug level.
    pub fn poll_commands(&mut self) -> Vec<Command> {
        self.commands
            .drain()
            .into_iter()
            .filter_map(|message| match parse_command(&message.payload) {
                Ok(command) => {
                    debug!(kind = command.kind(), raw = %message.payload, "command received");
                    Some(command)
                }
                Err(e) => {
                    debug!(raw = %message.payload, error = %e, "dropping malformed command");
                    None
                }
            })
            .collect()
    }

    // ── Outbound ────────────────────────────────────────────────────────────

    pub fn publish_state(&self, record: &StateRecord) -> bool {
        self.publish(Metric::State, record)
    }

    /// Publish `record` on the state topic bypassing its limiter.
    pub fn force_publish_state(&self, record: &StateRecord) {
        self.send(Metric::State, record);
    }

    pub fn publish_obstacles(&self, record: &ObstacleRecord) -> bool {
        self.publish(Metric::Obstacles, record)
    }

    pub fn publish_line(&self, record: &LineRecord) -> bool {
        self.publish(Metric::Line, record)
    }

    pub fn publish_color(&self, record: &ColorRecord) -> bool {
        self.publish(Metric::Color, record)
    }

    pub fn publish_temperature(&self, record: &MeasurementRecord) -> bool {
        self.publish(Metric::Temperature, record)
    }

    pub fn publish_humidity(&self, record: &MeasurementRecord) -> bool {
        self.publish(Metric::Humidity, record)
    }

    pub fn publish_alert(&self, record: &AlertRecord) -> bool {
        self.publish(Metric::Alert, record)
    }

    pub fn publish_message(&self, record: &MessageRecord) -> bool {
        self.publish(Metric::Message, record)
    }

    /// Publish `record` if the stream's limiter allows it.
    ///
    /// Returns `false` when the publish was suppressed by the limiter.
    fn publish<T: Serialize>(&self, metric: Metric, record: &T) -> bool {
        if let Some(limiter) = self.limiters.get(&metric) {
            if limiter.check().is_err() {
                return false;
            }
        }
        self.send(metric, record);
        true
    }

    fn send<T: Serialize>(&self, metric: Metric, record: &T) {
        let topic = self.topics.topic(metric);
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(topic = %topic, error = %e, "failed to serialize record");
                return;
            }
        };
        if let Err(e) = self.bus.publish(topic.as_str(), payload) {
            debug!(topic = %topic, error = %e, "publish failed");
        }
    }
}

fn quota(interval_ms: u64) -> Result<Quota, WheelbotError> {
    Quota::with_period(Duration::from_millis(interval_ms))
        .map(|q| q.allow_burst(NonZeroU32::MIN))
        .ok_or_else(|| {
            WheelbotError::InvalidConfig("publish interval must be non-zero".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wheelbot_types::{DriveDirection, OperatingState};

    fn comms(bus: &MessageBus) -> Communication {
        let config = CommunicationConfiguration {
            data_publish_interval_ms: 300,
            status_publish_interval_ms: 1000,
            ..CommunicationConfiguration::default()
        };
        Communication::new(bus.clone(), "John", &config).unwrap()
    }

    fn state_record() -> StateRecord {
        StateRecord::new(OperatingState::Ready, "Robot ready", 0, Utc::now())
    }

    #[test]
    fn commands_are_drained_and_parsed() {
        let bus = MessageBus::default();
        let mut comms = comms(&bus);

        bus.publish("avansict/John/command", "drive:forward:0.5").unwrap();
        bus.publish("avansict/John/command", "bogus").unwrap();
        bus.publish("avansict/Other/command", "emergency").unwrap();
        bus.publish("avansict/John/command", "emergency:stop").unwrap();

        let commands = comms.poll_commands();
        assert_eq!(
            commands,
            vec![
                Command::Drive {
                    direction: DriveDirection::Forward,
                    speed: 0.5
                },
                Command::Emergency { stop: true },
            ]
        );
        assert!(comms.poll_commands().is_empty());
    }

    #[test]
    fn two_publishes_within_interval_emit_one_payload() {
        let bus = MessageBus::default();
        let comms = comms(&bus);
        let mut sub = bus.subscribe_topic("avansict/John/state");

        assert!(comms.publish_state(&state_record()));
        assert!(!comms.publish_state(&state_record()));

        let received = sub.drain();
        assert_eq!(received.len(), 1);
        let json: serde_json::Value = serde_json::from_str(&received[0].payload).unwrap();
        assert_eq!(json["state"], "ready");
    }

    #[test]
    fn streams_are_limited_independently() {
        let bus = MessageBus::default();
        let comms = comms(&bus);
        let mut sub = bus.subscribe();

        let now = Utc::now();
        assert!(comms.publish_temperature(&MeasurementRecord::celsius(21.0, now)));
        assert!(comms.publish_humidity(&MeasurementRecord::percent(40.0, now)));
        assert!(!comms.publish_temperature(&MeasurementRecord::celsius(22.0, now)));

        let topics: Vec<_> = std::iter::from_fn(|| sub.try_recv().ok())
            .map(|m| m.topic)
            .collect();
        assert_eq!(
            topics,
            vec!["avansict/John/temperature", "avansict/John/humidity"]
        );
    }

    #[test]
    fn data_stream_reopens_after_interval() {
        let bus = MessageBus::default();
        let config = CommunicationConfiguration {
            data_publish_interval_ms: 20,
            ..CommunicationConfiguration::default()
        };
        let comms = Communication::new(bus.clone(), "John", &config).unwrap();
        let record = ColorRecord {
            color: "Red".into(),
            timestamp: Utc::now(),
        };

        assert!(comms.publish_color(&record));
        assert!(!comms.publish_color(&record));
        std::thread::sleep(Duration::from_millis(40));
        assert!(comms.publish_color(&record));
    }

    #[test]
    fn forced_state_bypasses_limiter() {
        let bus = MessageBus::default();
        let comms = comms(&bus);
        let mut sub = bus.subscribe_topic("avansict/John/state");

        assert!(comms.publish_state(&state_record()));
        comms.force_publish_state(&state_record());
        assert_eq!(sub.drain().len(), 2);
    }

    #[test]
    fn publish_without_subscribers_is_swallowed() {
        let bus = MessageBus::default();
        let comms = comms(&bus);
        // Only the command subscription exists; the alert publish finds no
        // matching receiver but the bus still has one live receiver.
        assert!(comms.publish_alert(&AlertRecord {
            active: true,
            message: "Obstacle at 12cm".into(),
            timestamp: Utc::now(),
        }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = CommunicationConfiguration {
            status_publish_interval_ms: 0,
            ..CommunicationConfiguration::default()
        };
        assert!(matches!(
            Communication::new(MessageBus::default(), "John", &config),
            Err(WheelbotError::InvalidConfig(_))
        ));
    }
}
