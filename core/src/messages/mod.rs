//! Wire messages. Every frame is one JSON document tagged by `type`.

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundMessage, StatusUpdate};
pub use outbound::{Command, OutboundMessage};
