use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::{messages::InboundMessage, prelude::*};

/// One complete message on the link, independent of the transport carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
    Close,
}

pub fn encode<M: Serialize>(message: &M) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode<M: DeserializeOwned>(text: &str) -> Result<M> {
    Ok(serde_json::from_str(text)?)
}

/// Frames carrying messages are UTF-8 JSON text; anything else is rejected.
pub fn decode_frame(frame: &Frame) -> Result<InboundMessage> {
    match frame {
        Frame::Text(text) => decode(text),
        Frame::Binary(_) => Err(Error::UnexpectedFrame("binary frame")),
        Frame::Close => Err(Error::UnexpectedFrame("close frame")),
    }
}

pub fn encode_frame<M: Serialize>(message: &M) -> Result<Frame> {
    encode(message).map(Frame::Text)
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::messages::{OutboundMessage, StatusUpdate};

    #[test]
    fn test_encode_frame_matches_json() {
        let message = OutboundMessage::disconnect();
        let frame = encode_frame(&message).unwrap();
        assert_eq!(frame, Frame::Text(serde_json::to_string(&message).unwrap()));
    }

    #[test]
    fn test_decode_text_frame() {
        let frame = Frame::Text(r#"{"type":"status","status":"new_msg"}"#.to_string());
        assert_eq!(decode_frame(&frame).unwrap(), InboundMessage::from(StatusUpdate::NewMsg));
    }

    #[test]
    fn test_binary_frames_rejected() {
        let frame = Frame::Binary(Bytes::from_static(br#"{"type":"status","status":"new_msg"}"#));
        assert!(matches!(decode_frame(&frame), Err(Error::UnexpectedFrame(_))));
        assert!(matches!(decode_frame(&Frame::Close), Err(Error::UnexpectedFrame(_))));
    }

    #[test]
    fn test_malformed_text_is_serialization_error() {
        let frame = Frame::Text("{\"type\":".to_string());
        assert!(matches!(decode_frame(&frame), Err(Error::Serialization(_))));
    }
}
