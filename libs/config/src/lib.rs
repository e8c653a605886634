//! # RPC Core Configuration
//!
//! Centralized settings and defaults for the RPC core crates.
//!
//! - **Registry**: coordination service address, root path, session and
//!   reconnection timing
//! - **Discovery**: load balance strategy selection
//! - **Codec**: default serializer and frame size limit
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rpc_config::{load_config, LoadBalanceKind};
//!
//! let config = load_config(Some("staging")).unwrap();
//! let discovery = config.discovery_settings();
//! if discovery.load_balance == LoadBalanceKind::RoundRobin {
//!     println!("rotating over {}", discovery.registry.base_path);
//! }
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{
    load_config, CodecSettings, DiscoverySection, DiscoverySettings, LoadBalanceKind, LoggingSettings,
    RegistrySettings, RpcConfig,
};
