//! Protocol-level constants for the RPC wire format
//!
//! These values are part of the wire contract. Every transport that frames
//! messages with [`crate::MessageHeader`] MUST agree on them byte-for-byte.

/// Protocol magic number
///
/// First two bytes of every message header, big-endian. Anything else in
/// that position means the peer is not speaking this protocol family.
pub const MAGIC_NUMBER: u16 = 0xCAFE;

/// Current protocol version
///
/// Decoding rejects any other version; negotiation is layered above the codec.
pub const PROTOCOL_VERSION: u8 = 1;

/// Encoded header size in bytes
///
/// magic (2) + version (1) + serializer (1) + message type (1)
/// + sequence id (4) + padding (1) + body length (4)
pub const HEADER_LEN: usize = 14;

/// Default upper bound on a single frame body (16MB)
///
/// Prevents a corrupted length field from triggering an unbounded allocation.
pub const DEFAULT_MAX_BODY_LEN: usize = 16 * 1024 * 1024;

/// Byte offsets of each header field
pub mod offsets {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 2;
    pub const SERIALIZER: usize = 3;
    pub const MESSAGE_TYPE: usize = 4;
    pub const SEQUENCE_ID: usize = 5;
    pub const PADDING: usize = 9;
    pub const LENGTH: usize = 10;
}
