//! Default values shared by the RPC core
//!
//! Settings structs in [`crate::service_config`] fall back to these when a
//! key is absent from every configuration source.

/// Coordination registry defaults
pub mod registry {
    /// Registry connect string
    pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2181";

    /// Root path every registration lives under
    pub const BASE_PATH: &str = "/rpc";

    /// Session timeout (milliseconds)
    pub const SESSION_TIMEOUT_MS: u64 = 60_000;

    /// Connection timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 15_000;

    /// Reconnection backoff base (milliseconds)
    pub const BASE_SLEEP_MS: u64 = 3_000;

    /// Upper bound on a single backoff sleep (milliseconds)
    pub const MAX_SLEEP_MS: u64 = 60_000;

    /// Maximum reconnection retries after the first attempt
    pub const MAX_RETRIES: u32 = 10;
}

/// Codec defaults
pub mod codec {
    /// Serializer used when the caller does not pick one
    pub const DEFAULT_SERIALIZER: &str = "json";

    /// Largest frame body accepted (16MB)
    pub const MAX_BODY_LEN: usize = 16 * 1024 * 1024;
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LEVEL: &str = "info";
}
