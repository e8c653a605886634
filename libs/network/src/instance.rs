//! Service instance description
//!
//! [`ServiceInfo`] is what providers publish under the registry root and what
//! discovery hands back to callers. It is stored as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

fn default_weight() -> u32 {
    1
}

/// One network-addressable deployment of a service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_name: String,
    #[serde(default)]
    pub version: String,
    pub host: String,
    pub port: u16,
    /// Relative share of traffic under weighted selection
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ServiceInfo {
    pub fn new(service_name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_name: service_name.into(),
            version: String::new(),
            host: host.into(),
            port,
            weight: default_weight(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed socket address, when `host` is an IP literal
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address().parse().ok()
    }

    /// Registry key of the service, `name` or `name:version`
    pub fn service_key(&self) -> String {
        if self.version.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}:{}", self.service_name, self.version)
        }
    }
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.service_key(), self.host, self.port)
    }
}

/// Registry-assigned identifier of one registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) String);

impl InstanceId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
