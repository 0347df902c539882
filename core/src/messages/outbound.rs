use derive_more::Display;
use serde::{Deserialize, Serialize};

// --------- sent by the client ---------  //

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    #[display("command({command})")]
    Command { command: Command },
}

impl OutboundMessage {
    pub fn connect() -> Self {
        Self::Command {
            command: Command::Connect,
        }
    }

    pub fn disconnect() -> Self {
        Self::Command {
            command: Command::Disconnect,
        }
    }
}

/// Asks the backend to bring its vehicle link up or down.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    #[display("connect")]
    Connect,
    #[display("disconnect")]
    Disconnect,
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_command_wire_format() {
        assert_eq!(
            serde_json::to_string(&OutboundMessage::connect()).unwrap(),
            r#"{"type":"command","command":"connect"}"#
        );
        assert_eq!(
            serde_json::to_string(&OutboundMessage::disconnect()).unwrap(),
            r#"{"type":"command","command":"disconnect"}"#
        );
        assert_eq!(OutboundMessage::connect().to_string(), "command(connect)");
    }
}
