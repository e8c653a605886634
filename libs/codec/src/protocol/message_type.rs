//! Message kinds carried in byte 4 of every header

use crate::{CodecError, Result};
use num_enum::TryFromPrimitive;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum MessageType {
    Request = 1,
    Response = 2,
    HeartbeatRequest = 3,
    HeartbeatResponse = 4,
}

impl MessageType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::try_from(tag).map_err(|_| CodecError::UnknownMessageType { tag })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn is_heartbeat(self) -> bool {
        matches!(self, MessageType::HeartbeatRequest | MessageType::HeartbeatResponse)
    }

    /// The message type a peer answers this one with, if any
    pub fn reply(self) -> Option<Self> {
        match self {
            MessageType::Request => Some(MessageType::Response),
            MessageType::HeartbeatRequest => Some(MessageType::HeartbeatResponse),
            MessageType::Response | MessageType::HeartbeatResponse => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_pairs() {
        assert_eq!(MessageType::Request.reply(), Some(MessageType::Response));
        assert_eq!(
            MessageType::HeartbeatRequest.reply(),
            Some(MessageType::HeartbeatResponse)
        );
        assert_eq!(MessageType::Response.reply(), None);
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(MessageType::from_tag(0), Err(CodecError::UnknownMessageType { tag: 0 }));
        assert_eq!(MessageType::from_tag(3).unwrap(), MessageType::HeartbeatRequest);
        assert!(MessageType::from_tag(3).unwrap().is_heartbeat());
    }
}
