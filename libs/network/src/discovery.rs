//! Service Discovery Facade
//!
//! Answers "give me one endpoint for service X": the local cache supplies
//! the candidates, the configured strategy picks one.

use crate::balance::{LoadBalance, LoadBalancer};
use crate::cache::LocalServiceCache;
use crate::coordinator::Coordinator;
use crate::error::{DiscoveryError, Result};
use crate::instance::ServiceInfo;
use crate::registry::RegistryClient;
use rpc_config::DiscoverySettings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ServiceDiscovery {
    registry: Arc<RegistryClient>,
    cache: LocalServiceCache,
    load_balancer: LoadBalancer,
    destroyed: AtomicBool,
}

impl ServiceDiscovery {
    /// Validate `settings`, start a registry session and build the facade
    pub async fn connect(settings: DiscoverySettings, coordinator: Arc<dyn Coordinator>) -> Result<Self> {
        settings
            .registry
            .validate()
            .map_err(|err| DiscoveryError::configuration(format!("{:#}", err)))?;

        let registry = Arc::new(RegistryClient::new(settings.registry, coordinator));
        registry.start().await?;

        Ok(Self::new(registry, LoadBalancer::from_kind(settings.load_balance)))
    }

    /// Build on an existing registry client
    pub fn new(registry: Arc<RegistryClient>, load_balancer: LoadBalancer) -> Self {
        info!(strategy = load_balancer.name(), "service discovery ready");
        Self {
            cache: LocalServiceCache::new(registry.clone()),
            registry,
            load_balancer,
            destroyed: AtomicBool::new(false),
        }
    }

    /// One instance of `service`, chosen by the configured strategy
    pub async fn discover(&self, service: &str) -> Result<ServiceInfo> {
        let candidates = self.get_services(service).await?;
        let chosen = self.load_balancer.choose_one(service, &candidates)?;
        debug!(service, address = %chosen.address(), candidates = candidates.len(), "discovered instance");
        Ok(chosen)
    }

    /// Like [`discover`](Self::discover), with an affinity key for key-aware strategies
    pub async fn discover_with_key(&self, service: &str, key: &str) -> Result<ServiceInfo> {
        let candidates = self.get_services(service).await?;
        let chosen = self.load_balancer.choose_one_keyed(service, &candidates, key)?;
        debug!(service, key, address = %chosen.address(), "discovered instance by key");
        Ok(chosen)
    }

    /// Current instances of `service` from the local cache
    pub async fn get_services(&self, service: &str) -> Result<Vec<ServiceInfo>> {
        if self.is_destroyed() {
            return Err(DiscoveryError::Destroyed);
        }
        self.cache.get_services(service).await
    }

    pub fn registry(&self) -> &Arc<RegistryClient> {
        &self.registry
    }

    pub fn load_balancer(&self) -> &LoadBalancer {
        &self.load_balancer
    }

    pub fn cached_services(&self) -> Vec<String> {
        self.cache.cached_services()
    }

    pub fn cache(&self) -> &LocalServiceCache {
        &self.cache
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Close every cache, then the registry client
    ///
    /// Calling it again does nothing.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cache.close_all();
        self.registry.close().await;
        info!("service discovery destroyed");
    }
}
