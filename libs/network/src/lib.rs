//! Service Discovery Infrastructure
//!
//! Resolves a logical service name into one concrete, load-balanced endpoint
//! through an external coordination registry.
//!
//! ```text
//! caller ──> ServiceDiscovery ──> LocalServiceCache ──> RegistryClient ──> Coordinator
//!                   │                  ▲      (watch callbacks)   │
//!                   └─> LoadBalancer   └──────────────────────────┘
//! ```
//!
//! - [`coordinator`]: the registry primitives (ephemeral nodes, child
//!   listing, child watches) behind a trait, plus an in-process
//!   implementation.
//! - [`registry`]: session lifecycle with backoff, keepalive and
//!   re-registration after reconnect.
//! - [`cache`]: lazily built per-service snapshots refreshed by watches.
//! - [`balance`]: random, round-robin, weighted and consistent-hash selection.
//! - [`discovery`]: the facade tying it together.
//!
//! ```no_run
//! use rpc_config::DiscoverySettings;
//! use rpc_network::{InMemoryCoordinator, ServiceDiscovery, ServiceInfo};
//! use std::sync::Arc;
//!
//! # async fn run() -> rpc_network::Result<()> {
//! let coordinator = Arc::new(InMemoryCoordinator::new());
//! let discovery = ServiceDiscovery::connect(DiscoverySettings::default(), coordinator).await?;
//!
//! discovery
//!     .registry()
//!     .register_instance(&ServiceInfo::new("order-service", "10.0.0.1", 8080))
//!     .await?;
//! let endpoint = discovery.discover("order-service").await?;
//! println!("calling {}", endpoint.address());
//!
//! discovery.destroy().await;
//! # Ok(())
//! # }
//! ```

pub mod balance;
pub mod cache;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod instance;
pub mod registry;

pub use balance::{LoadBalance, LoadBalancer};
pub use cache::{LocalServiceCache, ServiceCache};
pub use coordinator::{ChildEvent, ChildEventKind, Coordinator, InMemoryCoordinator, SessionId};
pub use discovery::ServiceDiscovery;
pub use error::{CoordinatorError, DiscoveryError, Result};
pub use instance::{InstanceId, ServiceInfo};
pub use registry::{RegistryClient, SessionState, WatchHandle};
