//! RPC Core Configuration Module
//!
//! Loads settings from an optional TOML file, environment-specific overrides
//! and `RPC_`-prefixed environment variables, in that order of precedence
//! (later sources win). Nested keys use a double underscore:
//! `RPC_REGISTRY__MAX_RETRIES=5` sets `registry.max_retries`.

use crate::service::{codec, logging, registry};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Top-level configuration for a process embedding the RPC core
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RpcConfig {
    pub registry: RegistrySettings,
    pub discovery: DiscoverySection,
    pub codec: CodecSettings,
    pub logging: LoggingSettings,
}

/// Coordination registry session settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RegistrySettings {
    /// Connect string of the coordination service
    pub address: String,
    /// Root path all service registrations live under
    pub base_path: String,
    pub session_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// First reconnection backoff; doubles per attempt
    pub base_sleep_ms: u64,
    pub max_sleep_ms: u64,
    /// Retries after the first failed connect before giving up
    pub max_retries: u32,
}

/// `[discovery]` section
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DiscoverySection {
    pub load_balance: LoadBalanceKind,
}

/// Everything a discovery facade needs to start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverySettings {
    pub load_balance: LoadBalanceKind,
    pub registry: RegistrySettings,
}

/// Header codec settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CodecSettings {
    pub serializer: String,
    pub max_body_len: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

/// Instance selection policy, picked once when discovery is constructed
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalanceKind {
    Random,
    #[default]
    RoundRobin,
    WeightedRandom,
    ConsistentHash,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            address: registry::DEFAULT_ADDRESS.to_string(),
            base_path: registry::BASE_PATH.to_string(),
            session_timeout_ms: registry::SESSION_TIMEOUT_MS,
            connect_timeout_ms: registry::CONNECT_TIMEOUT_MS,
            base_sleep_ms: registry::BASE_SLEEP_MS,
            max_sleep_ms: registry::MAX_SLEEP_MS,
            max_retries: registry::MAX_RETRIES,
        }
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            serializer: codec::DEFAULT_SERIALIZER.to_string(),
            max_body_len: codec::MAX_BODY_LEN,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

impl RegistrySettings {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Keepalive period: a third of the session timeout
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis((self.session_timeout_ms / 3).max(1))
    }

    /// Sleep before reconnection attempt `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.pow(attempt.min(16));
        let delay = self.base_sleep_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_sleep_ms))
    }

    /// Path holding every instance of `service`
    pub fn service_path(&self, service: &str) -> String {
        format!("{}/{}", self.base_path, service)
    }

    /// Validate the registry settings
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            bail!("registry.address cannot be empty");
        }
        // rules out "/" too, which would make service paths start with "//"
        if !self.base_path.starts_with('/') || self.base_path.ends_with('/') {
            bail!(
                "registry.base_path must be an absolute, non-root path without a trailing slash, got '{}'",
                self.base_path
            );
        }
        if self.session_timeout_ms == 0 {
            bail!("registry.session_timeout_ms cannot be zero");
        }
        if self.connect_timeout_ms == 0 {
            bail!("registry.connect_timeout_ms cannot be zero");
        }
        if self.max_sleep_ms < self.base_sleep_ms {
            bail!("registry.max_sleep_ms must be at least registry.base_sleep_ms");
        }
        Ok(())
    }
}

impl FromStr for LoadBalanceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random" => Ok(Self::Random),
            "round_robin" => Ok(Self::RoundRobin),
            "weighted_random" | "weighted" => Ok(Self::WeightedRandom),
            "consistent_hash" => Ok(Self::ConsistentHash),
            other => bail!("unknown load balance strategy '{}'", other),
        }
    }
}

impl RpcConfig {
    /// Load configuration from an optional base file plus environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(base) = base_path {
            builder = builder.add_source(File::from(base).required(true));
        }

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (RPC_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("RPC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: RpcConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.registry.validate().context("invalid [registry] section")?;
        if self.codec.serializer.trim().is_empty() {
            bail!("codec.serializer cannot be empty");
        }
        if self.codec.max_body_len == 0 {
            bail!("codec.max_body_len cannot be zero");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration as TOML")
    }

    /// Settings for a discovery facade backed by the configured registry
    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            load_balance: self.discovery.load_balance,
            registry: self.registry.clone(),
        }
    }
}

/// Convenience function to load configuration
///
/// Reads `config/rpc.toml` when present, then the optional environment file
/// and the process environment.
pub fn load_config(environment: Option<&str>) -> Result<RpcConfig> {
    let base = Path::new("config/rpc.toml");
    let base = if base.exists() { Some(base) } else { None };
    RpcConfig::load(base, environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_registry_contract() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.session_timeout(), Duration::from_secs(60));
        assert_eq!(settings.connect_timeout(), Duration::from_secs(15));
        assert_eq!(settings.max_retries, 10);
        assert_eq!(settings.keepalive_interval(), Duration::from_secs(20));
        settings.validate().unwrap();
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let settings = RegistrySettings {
            base_sleep_ms: 100,
            max_sleep_ms: 1_000,
            ..RegistrySettings::default()
        };
        assert_eq!(settings.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(settings.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(settings.backoff_delay(3), Duration::from_millis(800));
        assert_eq!(settings.backoff_delay(4), Duration::from_millis(1_000));
        assert_eq!(settings.backoff_delay(60), Duration::from_millis(1_000));
    }

    #[test]
    fn test_base_path_validation() {
        let mut settings = RegistrySettings::default();
        settings.base_path = "rpc".to_string();
        assert!(settings.validate().is_err());

        settings.base_path = "/rpc/".to_string();
        assert!(settings.validate().is_err());

        settings.base_path = "/".to_string();
        assert!(settings.validate().is_err());

        settings.base_path = "/rpc".to_string();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.service_path("svc"), "/rpc/svc");
    }

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rpc.toml");

        let config_content = r#"
[registry]
address = "10.0.0.9:2181"
base_path = "/prod_rpc"
max_retries = 4

[discovery]
load_balance = "consistent_hash"

[codec]
serializer = "kryo"

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = RpcConfig::load(Some(&config_path), None).unwrap();

        assert_eq!(config.registry.address, "10.0.0.9:2181");
        assert_eq!(config.registry.base_path, "/prod_rpc");
        assert_eq!(config.registry.max_retries, 4);
        // untouched keys keep their defaults
        assert_eq!(config.registry.session_timeout_ms, registry::SESSION_TIMEOUT_MS);
        assert_eq!(config.discovery.load_balance, LoadBalanceKind::ConsistentHash);
        assert_eq!(config.codec.serializer, "kryo");
        assert_eq!(config.logging.level, "debug");

        let discovery = config.discovery_settings();
        assert_eq!(discovery.registry.base_path, "/prod_rpc");
        assert_eq!(discovery.load_balance, LoadBalanceKind::ConsistentHash);
    }

    #[test]
    fn test_rendered_toml_loads_back() {
        let mut config = RpcConfig::default();
        config.discovery.load_balance = LoadBalanceKind::WeightedRandom;
        config.registry.max_retries = 2;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rpc.toml");
        fs::write(&config_path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(RpcConfig::load(Some(&config_path), None).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rpc.toml");
        fs::write(&config_path, "[registry]\nbase_path = \"relative\"\n").unwrap();

        let err = RpcConfig::load(Some(&config_path), None).unwrap_err();
        assert!(format!("{:#}", err).contains("base_path"));
    }

    #[test]
    fn test_load_balance_kind_parsing() {
        assert_eq!("round-robin".parse::<LoadBalanceKind>().unwrap(), LoadBalanceKind::RoundRobin);
        assert_eq!("Weighted".parse::<LoadBalanceKind>().unwrap(), LoadBalanceKind::WeightedRandom);
        assert!("fastest".parse::<LoadBalanceKind>().is_err());

        let json = serde_json::to_string(&LoadBalanceKind::ConsistentHash).unwrap();
        assert_eq!(json, "\"consistent_hash\"");
    }
}
