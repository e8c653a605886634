//! # RPC Protocol Codec
//!
//! Wire contract shared by every transport of the RPC framework:
//!
//! - [`MessageHeader`]: the fixed 14-byte header in front of every message
//! - [`SequenceGenerator`]: atomic correlation IDs stamped into each header
//! - [`Frame`] / [`FrameDecoder`]: header + body framing over byte buffers
//! - [`SerializerType`] / [`MessageType`]: enumerated header tags
//!
//! ## What This Crate Does NOT Contain
//! - Body serialization (only the serializer tag is carried)
//! - Socket handling or connection management
//!
//! ## Example
//!
//! ```rust
//! use rpc_codec::{Frame, FrameDecoder, MessageHeader, SequenceGenerator};
//! use bytes::BytesMut;
//!
//! let sequence = SequenceGenerator::new();
//! let header = MessageHeader::build("json", &sequence).unwrap();
//!
//! let mut wire = BytesMut::new();
//! Frame::new(header, &b"{}"[..]).unwrap().encode(&mut wire).unwrap();
//!
//! let frame = FrameDecoder::default().decode(&mut wire).unwrap().unwrap();
//! assert_eq!(frame.header.sequence_id, 0);
//! assert_eq!(&frame.body[..], b"{}");
//! ```

pub mod error;
pub mod frame;
pub mod header;
pub mod protocol;
pub mod protocol_constants;
pub mod sequence;

pub use error::{CodecError, Result};
pub use frame::{Frame, FrameDecoder};
pub use header::MessageHeader;
pub use protocol::{MessageType, SerializerType};
pub use protocol_constants::{DEFAULT_MAX_BODY_LEN, HEADER_LEN, MAGIC_NUMBER, PROTOCOL_VERSION};
pub use sequence::SequenceGenerator;
