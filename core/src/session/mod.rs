//! Owns the single live connection to the vehicle backend.
//!
//! [`SessionClient`] is the public face; behind it a manager actor holds at
//! most one session at a time and moves through [`Phase`]s:
//!
//! ```text
//! Unconfigured -> Connecting -> Open -> Closed
//!                     ^                   |
//!                     +-------------------+  reconfigure / reconnect / retry timer
//! ```

mod client;
#[cfg(test)]
mod memory;
pub(crate) mod manager;
pub mod transport;

use std::time::Duration;

use derive_more::Display;

pub use client::SessionClient;
pub use transport::{Connection, Connector, WsConnector};

use crate::messages::InboundMessage;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    /// no endpoint configured, nothing to connect to
    #[default]
    #[display("unconfigured")]
    Unconfigured,
    #[display("connecting")]
    Connecting,
    #[display("open")]
    Open,
    #[display("closed")]
    Closed,
}

/// Both default to off: a closed session stays closed until reconfigured or
/// explicitly reconnected, and connect attempts may take as long as the
/// transport takes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// fixed delay before one automatic reconnect attempt after a session closes
    pub retry_delay: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

/// Receives every successfully decoded inbound message, on the manager task.
pub trait MessageListener: Send + 'static {
    fn on_message(&mut self, message: InboundMessage);
}

impl<F> MessageListener for F
where
    F: FnMut(InboundMessage) + Send + 'static,
{
    fn on_message(&mut self, message: InboundMessage) {
        self(message)
    }
}
