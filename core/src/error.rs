use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio_tungstenite::tungstenite;

use crate::session::manager::SessionManagerEvent;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: &'static str },

    #[error("Serialization/Deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(&'static str),

    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Outbound buffer full, frame dropped")]
    OutboundFull,

    #[error("Timed out connecting to {endpoint} after {after:?}")]
    ConnectTimeout { endpoint: String, after: Duration },

    #[error("Clock period must be non-zero")]
    ZeroPeriod,

    #[error("Session manager is not running")]
    ManagerStopped,

    #[error("Error joining tokio tasks: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SendError<SessionManagerEvent>> for Error {
    fn from(_: SendError<SessionManagerEvent>) -> Self {
        Self::ManagerStopped
    }
}
