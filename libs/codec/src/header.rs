//! Fixed-size RPC message header
//!
//! ## Wire Layout (big-endian)
//!
//! ```text
//! +--------+---------+------------+----------+-------------+---------+-------------+
//! | magic  | version | serializer | msg type | sequence id | padding | body length |
//! | 2 byte | 1 byte  | 1 byte     | 1 byte   | 4 bytes     | 1 byte  | 4 bytes     |
//! +--------+---------+------------+----------+-------------+---------+-------------+
//! ```
//!
//! The body of exactly `length` bytes follows immediately; see [`crate::frame`].
//!
//! ## Validation
//!
//! [`MessageHeader::decode`] reports a short buffer or a foreign magic number
//! as [`CodecError::MalformedHeader`]. A matching magic with an unknown
//! version or unknown tags gets its own error variant so callers can tell a
//! foreign stream apart from a newer peer.

use crate::protocol_constants::{HEADER_LEN, MAGIC_NUMBER, PROTOCOL_VERSION};
use crate::{CodecError, MessageType, Result, SequenceGenerator, SerializerType};
use bytes::{Buf, BufMut};

/// Decoded or to-be-encoded message header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub magic_num: u16,
    pub version: u8,
    pub serializer_type: SerializerType,
    pub message_type: MessageType,
    pub sequence_id: u32,
    /// Alignment filler, carried through but never interpreted
    pub padding: u8,
    /// Length of the body that follows the header
    pub length: u32,
}

impl MessageHeader {
    /// Default request header for the named serializer
    ///
    /// Stamps the protocol magic and version and takes a fresh sequence ID
    /// from `sequence`. Body length starts at zero; framing sets it.
    pub fn build(serializer_name: &str, sequence: &SequenceGenerator) -> Result<Self> {
        let serializer_type = SerializerType::parse_by_name(serializer_name)?;
        Ok(Self::with_serializer(serializer_type, sequence))
    }

    /// Same as [`build`](Self::build) for an already resolved serializer
    pub fn with_serializer(serializer_type: SerializerType, sequence: &SequenceGenerator) -> Self {
        Self {
            magic_num: MAGIC_NUMBER,
            version: PROTOCOL_VERSION,
            serializer_type,
            message_type: MessageType::Request,
            sequence_id: sequence.next_id(),
            padding: 0,
            length: 0,
        }
    }

    /// Heartbeat probe header with an empty body
    pub fn heartbeat(serializer_type: SerializerType, sequence: &SequenceGenerator) -> Self {
        Self::with_serializer(serializer_type, sequence)
            .with_message_type(MessageType::HeartbeatRequest)
    }

    /// Header answering `request`: same sequence ID and serializer
    ///
    /// Heartbeat requests are answered with heartbeat responses, everything
    /// else with a plain response.
    pub fn response_to(request: &MessageHeader) -> Self {
        let message_type = request.message_type.reply().unwrap_or(MessageType::Response);
        Self {
            message_type,
            length: 0,
            ..*request
        }
    }

    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Encode into a fixed-size array
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let mut cursor = &mut out[..];
        self.encode_into(&mut cursor);
        out
    }

    /// Append the encoded header to `buf`
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.magic_num);
        buf.put_u8(self.version);
        buf.put_u8(self.serializer_type.tag());
        buf.put_u8(self.message_type.tag());
        buf.put_u32(self.sequence_id);
        buf.put_u8(self.padding);
        buf.put_u32(self.length);
    }

    /// Decode the header at the start of `src`
    ///
    /// Bytes past [`HEADER_LEN`] are ignored.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_LEN {
            return Err(CodecError::short_buffer(HEADER_LEN, src.len()));
        }

        let mut buf = &src[..HEADER_LEN];

        let magic_num = buf.get_u16();
        if magic_num != MAGIC_NUMBER {
            return Err(CodecError::bad_magic(MAGIC_NUMBER, magic_num));
        }

        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(CodecError::UnsupportedVersion {
                version,
                supported: PROTOCOL_VERSION,
            });
        }

        let serializer_type = SerializerType::from_tag(buf.get_u8())?;
        let message_type = MessageType::from_tag(buf.get_u8())?;
        let sequence_id = buf.get_u32();
        let padding = buf.get_u8();
        let length = buf.get_u32();

        Ok(Self {
            magic_num,
            version,
            serializer_type,
            message_type,
            sequence_id,
            padding,
            length,
        })
    }
}
