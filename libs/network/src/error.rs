//! Discovery Error Types
//!
//! Error handling for the coordination registry session, the local service
//! cache and instance selection.

use thiserror::Error;

/// Result type alias for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for raw coordinator calls
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;

/// Failures reported by the coordination service itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordination service cannot be reached
    #[error("Connection to coordination service lost")]
    ConnectionLoss,

    /// The server no longer knows this session; its ephemeral nodes are gone
    #[error("Session {session} expired")]
    SessionExpired { session: u64 },

    #[error("Node already exists: {path}")]
    NodeExists { path: String },

    #[error("No node at {path}")]
    NoNode { path: String },

    #[error("Coordinator operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl CoordinatorError {
    /// Errors that invalidate the current session and call for a reconnect
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            CoordinatorError::ConnectionLoss
                | CoordinatorError::SessionExpired { .. }
                | CoordinatorError::Timeout { .. }
        )
    }
}

/// Main discovery error type
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Session could not be established within the retry budget, was lost,
    /// or the client is closed
    #[error("Registry unavailable after {attempts} attempt(s): {message}")]
    RegistryUnavailable { message: String, attempts: u32 },

    /// Selection over an empty candidate list
    #[error("No available instance for service '{service}'")]
    NoAvailableInstance { service: String },

    /// Watch subscription or initial population of a cache entry failed
    #[error("Failed to build service cache for '{service}': {source}")]
    CacheConstruction {
        service: String,
        source: Box<DiscoveryError>,
    },

    /// Raw coordinator failure that was not recovered
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// Instance payload could not be encoded or decoded
    #[error("Instance payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Instance rejected before it reached the registry
    #[error("Invalid service instance: {message}")]
    InvalidInstance { message: String },

    /// Settings rejected at construction time
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The discovery facade has been torn down
    #[error("Service discovery has been destroyed")]
    Destroyed,
}

impl DiscoveryError {
    /// Create a registry unavailable error
    pub fn registry_unavailable(message: impl Into<String>, attempts: u32) -> Self {
        Self::RegistryUnavailable {
            message: message.into(),
            attempts,
        }
    }

    /// Create a no available instance error
    pub fn no_available_instance(service: impl Into<String>) -> Self {
        Self::NoAvailableInstance {
            service: service.into(),
        }
    }

    /// Wrap a failure raised while building a cache entry
    ///
    /// Registry unavailability passes through unchanged so callers can match
    /// on it directly.
    pub fn cache_construction(service: impl Into<String>, source: DiscoveryError) -> Self {
        match source {
            err @ DiscoveryError::RegistryUnavailable { .. } => err,
            err @ DiscoveryError::Destroyed => err,
            err => Self::CacheConstruction {
                service: service.into(),
                source: Box::new(err),
            },
        }
    }

    /// Create an invalid instance error
    pub fn invalid_instance(message: impl Into<String>) -> Self {
        Self::InvalidInstance {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Coordinator error that should trigger session recovery
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DiscoveryError::Coordinator(err) if err.is_connection_error())
    }

    /// Check if this is a retryable error
    ///
    /// Retrying is the calling layer's decision; this only reports whether a
    /// later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DiscoveryError::RegistryUnavailable { .. } => false,
            DiscoveryError::NoAvailableInstance { .. } => true,
            DiscoveryError::CacheConstruction { source, .. } => source.is_retryable(),
            DiscoveryError::Coordinator(err) => err.is_connection_error(),
            DiscoveryError::Serialization(_) => false,
            DiscoveryError::InvalidInstance { .. } => false,
            DiscoveryError::Configuration { .. } => false,
            DiscoveryError::Destroyed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_construction_passes_unavailable_through() {
        let err = DiscoveryError::cache_construction(
            "orders",
            DiscoveryError::registry_unavailable("session lost", 11),
        );
        assert!(matches!(err, DiscoveryError::RegistryUnavailable { attempts: 11, .. }));

        let err = DiscoveryError::cache_construction(
            "orders",
            CoordinatorError::NoNode { path: "/rpc/orders".into() }.into(),
        );
        assert!(matches!(err, DiscoveryError::CacheConstruction { ref service, .. } if service == "orders"));
        assert!(err.to_string().contains("/rpc/orders"));
    }

    #[test]
    fn test_retryability() {
        assert!(DiscoveryError::no_available_instance("svc").is_retryable());
        assert!(DiscoveryError::from(CoordinatorError::ConnectionLoss).is_retryable());
        assert!(!DiscoveryError::from(CoordinatorError::NodeExists { path: "/x".into() }).is_retryable());
        assert!(!DiscoveryError::Destroyed.is_retryable());
    }

    #[test]
    fn test_connection_errors() {
        assert!(CoordinatorError::SessionExpired { session: 3 }.is_connection_error());
        assert!(CoordinatorError::Timeout { timeout_ms: 10 }.is_connection_error());
        assert!(!CoordinatorError::NoNode { path: "/".into() }.is_connection_error());
        assert!(DiscoveryError::from(CoordinatorError::ConnectionLoss).is_connection_error());
    }
}
