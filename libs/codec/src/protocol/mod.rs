//! Enumerated tags of the RPC wire protocol

pub mod message_type;
pub mod serializer_type;

pub use message_type::MessageType;
pub use serializer_type::SerializerType;
