//! Serializer tags carried in byte 3 of every header

use crate::{CodecError, Result};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body serialization codec identifier
///
/// Only the tag is handled here; the codecs themselves live with the
/// transport that encodes message bodies.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    Jdk = 0,
    Json = 1,
    Hessian = 2,
    Kryo = 3,
    Protostuff = 4,
}

impl SerializerType {
    pub const ALL: [SerializerType; 5] = [
        SerializerType::Jdk,
        SerializerType::Json,
        SerializerType::Hessian,
        SerializerType::Kryo,
        SerializerType::Protostuff,
    ];

    /// Resolve a serializer by name, ignoring ASCII case
    pub fn parse_by_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CodecError::unknown_serializer(name))
    }

    /// Resolve a wire tag
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::try_from(tag).map_err(|_| CodecError::UnknownSerializerTag { tag })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SerializerType::Jdk => "jdk",
            SerializerType::Json => "json",
            SerializerType::Hessian => "hessian",
            SerializerType::Kryo => "kryo",
            SerializerType::Protostuff => "protostuff",
        }
    }
}

impl FromStr for SerializerType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_by_name(s)
    }
}

impl fmt::Display for SerializerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
