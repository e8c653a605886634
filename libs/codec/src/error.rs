//! Codec errors for header and frame processing
//!
//! Decode failures always surface to the caller. A frame that fails
//! validation is never reinterpreted or patched up.

use thiserror::Error;

/// Result alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Header and frame codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer too short to hold a header, or the magic number is wrong
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// Serializer name does not map to a known codec tag
    #[error("Unknown serializer '{name}': expected one of jdk, json, hessian, kryo, protostuff")]
    UnknownSerializer { name: String },

    /// Serializer tag on the wire is not a known codec
    #[error("Unknown serializer tag {tag}")]
    UnknownSerializerTag { tag: u8 },

    /// Message type tag on the wire is not recognized
    #[error("Unknown message type {tag}")]
    UnknownMessageType { tag: u8 },

    /// Protocol version differs from the one this codec speaks
    #[error("Unsupported protocol version {version}: supported version is {supported}")]
    UnsupportedVersion { version: u8, supported: u8 },

    /// Frame body exceeds the configured limit
    #[error("Frame body too large: {size} bytes exceeds limit {limit}")]
    BodyTooLarge { size: usize, limit: usize },
}

impl CodecError {
    /// Header buffer shorter than the fixed header length
    pub fn short_buffer(need: usize, got: usize) -> Self {
        Self::MalformedHeader {
            reason: format!("need {} bytes, got {}", need, got),
        }
    }

    /// Magic number mismatch, with a hint when the bytes are merely swapped
    pub fn bad_magic(expected: u16, actual: u16) -> Self {
        let hint = if actual.swap_bytes() == expected {
            " (byte order mismatch)"
        } else {
            ""
        };
        Self::MalformedHeader {
            reason: format!(
                "invalid magic number: expected {:#06x}, got {:#06x}{}",
                expected, actual, hint
            ),
        }
    }

    pub fn unknown_serializer(name: impl Into<String>) -> Self {
        Self::UnknownSerializer { name: name.into() }
    }

    /// True when the bytes cannot be a frame of this protocol at all
    pub fn is_malformed(&self) -> bool {
        matches!(self, CodecError::MalformedHeader { .. })
    }

    /// Whether the connection can keep reading after this error
    ///
    /// Once framing is lost every following byte is suspect, so only
    /// errors raised before anything was consumed are recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::UnknownSerializer { .. })
    }
}
