//! Client-side view of the vehicle, rebuilt from inbound messages.
//!
//! [`ViewState::apply`] and [`ViewState::tick`] are pure: they take the
//! current snapshot by value and return the next one. [`ViewStore`] is the
//! shared place those snapshots are published.

mod logs;
mod store;

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};

pub use logs::{DEFAULT_LOG_CAPACITY, LogEntry, LogSequence, Severity};
pub use store::{ViewStore, spawn_clock};

use crate::messages::{InboundMessage, StatusUpdate};

/// Whether the vehicle reports a live link. Anything the backend sends other
/// than "yes"/"no" is kept as `Unknown`.
#[derive(Default, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Link {
    #[display("yes")]
    Yes,
    #[default]
    #[display("no")]
    No,
    #[display("unknown")]
    Unknown,
}

impl From<String> for Link {
    fn from(value: String) -> Self {
        match value.as_str() {
            "yes" => Self::Yes,
            "no" => Self::No,
            _ => Self::Unknown,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    #[serde(rename = "connection")]
    pub connected: Link,
    pub mode: String,
    #[serde(rename = "imageCount", deserialize_with = "lenient_count")]
    pub image_count: u64,
    #[serde(rename = "timeSinceMessage", deserialize_with = "lenient_count")]
    pub time_since_last_message: u64,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            connected: Link::No,
            mode: "null".to_string(),
            image_count: 0,
            time_since_last_message: 0,
        }
    }
}

/// counts arrive either as numbers or as numeric strings
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub status: StatusRecord,
    pub current_image: Option<String>,
    pub logs: LogSequence,
}

impl ViewState {
    pub fn new(log_capacity: Option<usize>) -> Self {
        Self {
            status: StatusRecord::default(),
            current_image: None,
            logs: LogSequence::with_capacity(log_capacity),
        }
    }

    /// Next state after `message`. Unknown message kinds leave the state as is.
    pub fn apply(mut self, message: &InboundMessage) -> Self {
        match message {
            InboundMessage::Status { update } => match update {
                StatusUpdate::NewMsg => {
                    self.status.time_since_last_message = 0;
                }
                StatusUpdate::Mode { value } => {
                    self.status.mode = value.clone();
                }
                StatusUpdate::Connection { value } => {
                    self.status.connected = *value;
                }
                StatusUpdate::NewImg { value } => {
                    self.status.image_count = self.status.image_count.saturating_add(1);
                    self.current_image = Some(value.clone());
                }
                StatusUpdate::Unknown => {}
            },
            InboundMessage::Load { status, image } => {
                self.status = status.clone();
                self.current_image = image.clone();
            }
            InboundMessage::Log(entry) => {
                self.logs.push(entry.clone());
            }
            InboundMessage::Unknown => {}
        }
        self
    }

    /// One second of the local clock without a `new_msg`.
    pub fn tick(mut self) -> Self {
        self.status.time_since_last_message = self.status.time_since_last_message.saturating_add(1);
        self
    }
}
