use serde::{Deserialize, Serialize};

use crate::state::{LogEntry, Link, StatusRecord};

// --------- sent by the vehicle backend ---------  //

/// Tag values this client does not know decode to `Unknown` rather than
/// failing, so newer backends can add message kinds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Status {
        #[serde(flatten)]
        update: StatusUpdate,
    },
    /// full snapshot, sent on (re)connection
    Load {
        #[serde(rename = "uavStatus")]
        status: StatusRecord,
        #[serde(rename = "imageName", default)]
        image: Option<String>,
    },
    Log(LogEntry),
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusUpdate {
    NewMsg,
    Mode { value: String },
    Connection { value: Link },
    NewImg { value: String },
    #[serde(other)]
    Unknown,
}

impl From<StatusUpdate> for InboundMessage {
    fn from(update: StatusUpdate) -> Self {
        Self::Status { update }
    }
}

impl From<LogEntry> for InboundMessage {
    fn from(entry: LogEntry) -> Self {
        Self::Log(entry)
    }
}
