//! Header + body framing
//!
//! A frame is one [`MessageHeader`] followed by exactly `header.length` body
//! bytes. [`FrameDecoder`] works on a growing read buffer: it returns
//! `Ok(None)` while the frame is incomplete and consumes exactly one frame
//! once it is whole.

use crate::protocol_constants::{DEFAULT_MAX_BODY_LEN, HEADER_LEN};
use crate::{CodecError, MessageHeader, Result};
use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

/// A complete message: header plus serialized body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: MessageHeader,
    pub body: Bytes,
}

/// Body length as carried in the 32-bit header field
fn wire_length(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CodecError::BodyTooLarge {
        size: len,
        limit: u32::MAX as usize,
    })
}

impl Frame {
    /// Pair a header with its body, fixing up the header length
    ///
    /// Fails with [`CodecError::BodyTooLarge`] when the body length does not
    /// fit the header's length field.
    pub fn new(header: MessageHeader, body: impl Into<Bytes>) -> Result<Self> {
        let body = body.into();
        let header = header.with_length(wire_length(body.len())?);
        Ok(Self { header, body })
    }

    /// Total encoded size
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.len()
    }

    /// Append the encoded frame to `dst` using the default body limit
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.encode_with_limit(dst, DEFAULT_MAX_BODY_LEN)
    }

    /// Append the encoded frame to `dst`, rejecting bodies above `max_body_len`
    pub fn encode_with_limit(&self, dst: &mut BytesMut, max_body_len: usize) -> Result<()> {
        if self.body.len() > max_body_len {
            return Err(CodecError::BodyTooLarge {
                size: self.body.len(),
                limit: max_body_len,
            });
        }
        let length = wire_length(self.body.len())?;

        dst.reserve(self.encoded_len());
        self.header.with_length(length).encode_into(dst);
        dst.extend_from_slice(&self.body);
        Ok(())
    }
}

/// Streaming frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    max_body_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_LEN)
    }
}

impl FrameDecoder {
    pub fn new(max_body_len: usize) -> Self {
        Self { max_body_len }
    }

    pub fn max_body_len(&self) -> usize {
        self.max_body_len
    }

    /// Try to take one frame off the front of `src`
    ///
    /// The header is validated as soon as it is fully buffered, so a foreign
    /// stream is rejected without waiting for a body that will never come.
    /// Nothing is consumed unless a whole frame is returned.
    pub fn decode(&self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let header = MessageHeader::decode(&src[..HEADER_LEN])?;
        let body_len = header.length as usize;
        if body_len > self.max_body_len {
            debug!(
                sequence_id = header.sequence_id,
                body_len,
                limit = self.max_body_len,
                "rejecting oversized frame"
            );
            return Err(CodecError::BodyTooLarge {
                size: body_len,
                limit: self.max_body_len,
            });
        }

        let frame_len = HEADER_LEN + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let body = src.split_to(body_len).freeze();
        Ok(Some(Frame { header, body }))
    }
}
