//! Inbound entry point: message payload -> [`Command`] -> [`CommandQueue`].
//!
//! Payloads are JSON objects with `command` and optional `iParam`, `fParam`
//! and `cParam`. Absent parameters default to zero or empty.

use std::sync::Arc;

use serde::Deserialize;

use crate::commands::{Command, ParamText};
use crate::config::BridgeConfig;
use crate::error::InboundError;
use crate::queue::CommandQueue;

#[derive(Debug, Deserialize)]
struct RawCommand {
    command: Option<String>,
    #[serde(rename = "iParam", default)]
    i_param: i64,
    #[serde(rename = "fParam", default)]
    f_param: f64,
    #[serde(rename = "cParam", default)]
    c_param: String,
}

/// Parse one payload. Unknown keys are ignored.
pub fn parse_command(payload: &[u8]) -> Result<Command, InboundError> {
    let raw: RawCommand = serde_json::from_slice(payload)?;
    let mnemonic = raw.command.ok_or(InboundError::MissingCommand)?;
    let mut command = Command::new(&mnemonic)?;
    if command.mnemonic.is_empty() {
        return Err(InboundError::MissingCommand);
    }
    command.int_param = raw.i_param;
    command.float_param = raw.f_param;
    command.text_param = ParamText::new("cParam", raw.c_param)?;
    Ok(command)
}

/// Producer side of the command path, fed by the network message loop.
#[derive(Debug, Clone)]
pub struct InboundHandler {
    queue: Arc<CommandQueue>,
    command_topic: String,
}

impl InboundHandler {
    pub fn new(queue: Arc<CommandQueue>, config: &BridgeConfig) -> Self {
        Self::with_topic(queue, config.command_topic())
    }

    pub fn with_topic(queue: Arc<CommandQueue>, command_topic: impl Into<String>) -> Self {
        Self {
            queue,
            command_topic: command_topic.into(),
        }
    }

    #[must_use]
    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    /// Handle one received message. Returns `Ok(false)` for topics other
    /// than the command topic, `Ok(true)` once the command is queued.
    pub fn on_message(&self, topic: &str, payload: &[u8]) -> Result<bool, InboundError> {
        if topic != self.command_topic {
            log::debug!("ignoring message on {topic}");
            return Ok(false);
        }
        let command = parse_command(payload).map_err(|e| {
            log::warn!("rejected command payload on {topic}: {e}");
            e
        })?;
        log::debug!("queued {}", command.mnemonic());
        self.queue.push(command);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_absent_fields() {
        let c = parse_command(br#"{"command":"cdon"}"#).unwrap();
        assert_eq!(c.mnemonic(), "CDON");
        assert_eq!(c.int_param, 0);
        assert!(c.text_param.is_empty());
    }

    #[test]
    fn missing_command_is_rejected() {
        assert!(matches!(
            parse_command(br#"{"iParam":3}"#),
            Err(InboundError::MissingCommand)
        ));
        assert!(matches!(
            parse_command(br#"{"command":"  "}"#),
            Err(InboundError::MissingCommand)
        ));
    }

    #[test]
    fn wrong_type_is_json_error() {
        assert!(matches!(
            parse_command(br#"{"command":"BT","iParam":"two"}"#),
            Err(InboundError::Json(_))
        ));
    }
}
