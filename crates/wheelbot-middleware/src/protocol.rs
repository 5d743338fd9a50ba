//! Command wire format and topic layout.
//!
//! Operators send plain colon-delimited strings on `<base>/<robot>/command`:
//!
//! | Text | Parsed as |
//! |---|---|
//! | `drive:<forward\|backward\|stop>:<speed>` | [`Command::Drive`] |
//! | `emergency` / `emergency:stop` | [`Command::Emergency`] `{ stop: true }` |
//! | `emergency:<anything else>` | [`Command::Emergency`] `{ stop: false }` |
//! | `alert:<text>` | [`Command::Alert`] |
//! | `message:<text>` | [`Command::Message`] |
//!
//! Free text after `alert:` and `message:` may itself contain colons; the
//! remaining tokens are joined back together. Anything else is rejected.

use thiserror::Error;
use wheelbot_types::{Command, DriveDirection};

/// Why a command string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing argument '{0}'")]
    MissingArgument(&'static str),
    #[error("invalid drive direction '{0}'")]
    InvalidDirection(String),
    #[error("invalid speed '{0}'")]
    InvalidSpeed(String),
}

/// Parse one raw command string.
pub fn parse_command(raw: &str) -> Result<Command, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut tokens = raw.split(':');
    // `split` always yields at least one token.
    let head = tokens.next().unwrap_or_default().trim().to_ascii_lowercase();

    match head.as_str() {
        "drive" => {
            let direction = tokens
                .next()
                .ok_or(ParseError::MissingArgument("direction"))?;
            let direction: DriveDirection = direction
                .parse()
                .map_err(|_| ParseError::InvalidDirection(direction.to_string()))?;
            let speed = tokens.next().ok_or(ParseError::MissingArgument("speed"))?;
            let speed: f64 = speed
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidSpeed(speed.to_string()))?;
            if !speed.is_finite() {
                return Err(ParseError::InvalidSpeed(speed.to_string()));
            }
            Ok(Command::Drive { direction, speed })
        }
        "emergency" => {
            let stop = match tokens.next() {
                None => true,
                Some(arg) => arg.trim().eq_ignore_ascii_case("stop"),
            };
            Ok(Command::Emergency { stop })
        }
        "alert" => Ok(Command::Alert {
            message: rejoin(tokens),
        }),
        "message" => Ok(Command::Message { text: rejoin(tokens) }),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn rejoin<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(":")
}

// ────────────────────────────────────────────────────────────────────────────
// Topics
// ────────────────────────────────────────────────────────────────────────────

/// Per-metric topic suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Command,
    State,
    Obstacles,
    Line,
    Color,
    Temperature,
    Humidity,
    Alert,
    Message,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Command => "command",
            Metric::State => "state",
            Metric::Obstacles => "obstacles",
            Metric::Line => "line",
            Metric::Color => "color",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Alert => "alert",
            Metric::Message => "message",
        }
    }
}

/// Topic names for one robot: `<base>/<robot>/<metric>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    prefix: String,
}

impl TopicSet {
    pub fn new(base_topic: &str, robot_name: &str) -> Self {
        Self {
            prefix: format!("{}/{}", base_topic.trim_end_matches('/'), robot_name),
        }
    }

    pub fn topic(&self, metric: Metric) -> String {
        format!("{}/{}", self.prefix, metric.as_str())
    }

    pub fn command(&self) -> String {
        self.topic(Metric::Command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_command_parses() {
        assert_eq!(
            parse_command("drive:forward:0.5"),
            Ok(Command::Drive {
                direction: DriveDirection::Forward,
                speed: 0.5
            })
        );
        assert_eq!(
            parse_command("DRIVE:Backward:1"),
            Ok(Command::Drive {
                direction: DriveDirection::Backward,
                speed: 1.0
            })
        );
    }

    #[test]
    fn malformed_drive_is_rejected() {
        assert_eq!(
            parse_command("drive:forward:abc"),
            Err(ParseError::InvalidSpeed("abc".into()))
        );
        assert_eq!(
            parse_command("drive:sideways:0.5"),
            Err(ParseError::InvalidDirection("sideways".into()))
        );
        assert_eq!(
            parse_command("drive:forward"),
            Err(ParseError::MissingArgument("speed"))
        );
        assert!(parse_command("drive:forward:NaN").is_err());
    }

    #[test]
    fn emergency_variants() {
        assert_eq!(parse_command("emergency"), Ok(Command::Emergency { stop: true }));
        assert_eq!(parse_command("emergency:stop"), Ok(Command::Emergency { stop: true }));
        assert_eq!(parse_command("emergency:release"), Ok(Command::Emergency { stop: false }));
        assert_eq!(parse_command("emergency:"), Ok(Command::Emergency { stop: false }));
    }

    #[test]
    fn alert_text_keeps_inner_colons() {
        assert_eq!(
            parse_command("alert:low battery:now"),
            Ok(Command::Alert {
                message: "low battery:now".into()
            })
        );
        assert_eq!(parse_command("alert"), Ok(Command::Alert { message: String::new() }));
    }

    #[test]
    fn message_command() {
        assert_eq!(
            parse_command("message:hello:world"),
            Ok(Command::Message {
                text: "hello:world".into()
            })
        );
    }

    #[test]
    fn unknown_and_empty_are_rejected() {
        assert_eq!(parse_command(""), Err(ParseError::Empty));
        assert_eq!(
            parse_command("dance:now"),
            Err(ParseError::UnknownCommand("dance".into()))
        );
    }

    #[test]
    fn rejection_reasons_are_readable_errors() {
        let err = parse_command("drive:sideways:1").unwrap_err();
        assert_eq!(err.to_string(), "invalid drive direction 'sideways'");

        let boxed: Box<dyn std::error::Error> = Box::new(parse_command("drive").unwrap_err());
        assert_eq!(boxed.to_string(), "missing argument 'direction'");
    }

    #[test]
    fn topics_follow_base_robot_metric() {
        let topics = TopicSet::new("avansict", "John");
        assert_eq!(topics.command(), "avansict/John/command");
        assert_eq!(topics.topic(Metric::Obstacles), "avansict/John/obstacles");
        assert_eq!(
            TopicSet::new("avansict/", "John").topic(Metric::State),
            "avansict/John/state"
        );
    }
}
