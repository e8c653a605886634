//! Load Balance Strategies
//!
//! Pick one instance out of the candidates discovery found for a service.
//! The strategy is chosen once, when the discovery facade is built, from
//! [`LoadBalanceKind`]; per-service state (rotation counters, hash rings)
//! lives inside the strategy.

mod consistent_hash;
mod random;
mod round_robin;
mod weighted;

pub use consistent_hash::{ConsistentHashBalance, VIRTUAL_NODES};
pub use random::RandomBalance;
pub use round_robin::RoundRobinBalance;
pub use weighted::WeightedRandomBalance;

use crate::error::{DiscoveryError, Result};
use crate::instance::ServiceInfo;
use rpc_config::LoadBalanceKind;

/// Instance selection policy
pub trait LoadBalance: Send + Sync {
    /// Select one of `candidates`; fails with `NoAvailableInstance` when empty
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo>;

    /// Select with a caller-supplied affinity key
    ///
    /// Only key-aware strategies look at `key`.
    fn choose_one_keyed(&self, service: &str, candidates: &[ServiceInfo], _key: &str) -> Result<ServiceInfo> {
        self.choose_one(service, candidates)
    }

    fn name(&self) -> &'static str;
}

pub(crate) fn ensure_candidates(service: &str, candidates: &[ServiceInfo]) -> Result<()> {
    if candidates.is_empty() {
        Err(DiscoveryError::no_available_instance(service))
    } else {
        Ok(())
    }
}

/// The configured strategy
#[derive(Debug)]
pub enum LoadBalancer {
    Random(RandomBalance),
    RoundRobin(RoundRobinBalance),
    WeightedRandom(WeightedRandomBalance),
    ConsistentHash(ConsistentHashBalance),
}

impl LoadBalancer {
    pub fn from_kind(kind: LoadBalanceKind) -> Self {
        match kind {
            LoadBalanceKind::Random => LoadBalancer::Random(RandomBalance),
            LoadBalanceKind::RoundRobin => LoadBalancer::RoundRobin(RoundRobinBalance::new()),
            LoadBalanceKind::WeightedRandom => LoadBalancer::WeightedRandom(WeightedRandomBalance),
            LoadBalanceKind::ConsistentHash => LoadBalancer::ConsistentHash(ConsistentHashBalance::new()),
        }
    }

    pub fn kind(&self) -> LoadBalanceKind {
        match self {
            LoadBalancer::Random(_) => LoadBalanceKind::Random,
            LoadBalancer::RoundRobin(_) => LoadBalanceKind::RoundRobin,
            LoadBalancer::WeightedRandom(_) => LoadBalanceKind::WeightedRandom,
            LoadBalancer::ConsistentHash(_) => LoadBalanceKind::ConsistentHash,
        }
    }

    fn strategy(&self) -> &dyn LoadBalance {
        match self {
            LoadBalancer::Random(s) => s,
            LoadBalancer::RoundRobin(s) => s,
            LoadBalancer::WeightedRandom(s) => s,
            LoadBalancer::ConsistentHash(s) => s,
        }
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::from_kind(LoadBalanceKind::default())
    }
}

impl LoadBalance for LoadBalancer {
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo> {
        self.strategy().choose_one(service, candidates)
    }

    fn choose_one_keyed(&self, service: &str, candidates: &[ServiceInfo], key: &str) -> Result<ServiceInfo> {
        self.strategy().choose_one_keyed(service, candidates, key)
    }

    fn name(&self) -> &'static str {
        self.strategy().name()
    }
}
