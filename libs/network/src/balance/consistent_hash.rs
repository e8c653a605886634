use super::{ensure_candidates, LoadBalance};
use crate::error::Result;
use crate::instance::ServiceInfo;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Ring positions per instance
pub const VIRTUAL_NODES: usize = 160;

#[derive(Debug)]
struct Ring {
    /// Sorted addresses the ring was built from
    fingerprint: Vec<String>,
    points: BTreeMap<u32, String>,
}

impl Ring {
    fn build(fingerprint: Vec<String>) -> Self {
        let mut points = BTreeMap::new();
        for address in &fingerprint {
            for replica in 0..VIRTUAL_NODES {
                let point = crc32fast::hash(format!("{}#{}", address, replica).as_bytes());
                points.insert(point, address.clone());
            }
        }
        Self { fingerprint, points }
    }

    /// First ring point at or after the hash of `key`, wrapping around
    fn locate(&self, key: &str) -> Option<&str> {
        let hash = crc32fast::hash(key.as_bytes());
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, address)| address.as_str())
    }
}

/// Maps a key to an instance on a hash ring
///
/// Keys stick to the same instance while the candidate set is unchanged and
/// mostly stay put when instances join or leave. Un-keyed selection uses the
/// service name as the key.
#[derive(Debug, Default)]
pub struct ConsistentHashBalance {
    rings: DashMap<String, Arc<Ring>>,
}

impl ConsistentHashBalance {
    pub fn new() -> Self {
        Self::default()
    }

    fn ring_for(&self, service: &str, candidates: &[ServiceInfo]) -> Arc<Ring> {
        let mut fingerprint: Vec<String> = candidates.iter().map(ServiceInfo::address).collect();
        fingerprint.sort();
        fingerprint.dedup();

        let cached = self.rings.get(service).map(|ring| ring.value().clone());
        if let Some(ring) = cached {
            if ring.fingerprint == fingerprint {
                return ring;
            }
        }

        debug!(service, instances = fingerprint.len(), "rebuilding hash ring");
        let ring = Arc::new(Ring::build(fingerprint));
        self.rings.insert(service.to_string(), ring.clone());
        ring
    }
}

impl LoadBalance for ConsistentHashBalance {
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo> {
        self.choose_one_keyed(service, candidates, service)
    }

    fn choose_one_keyed(&self, service: &str, candidates: &[ServiceInfo], key: &str) -> Result<ServiceInfo> {
        ensure_candidates(service, candidates)?;

        let ring = self.ring_for(service, candidates);
        let chosen = ring
            .locate(key)
            .and_then(|address| candidates.iter().find(|c| c.address() == address))
            .unwrap_or(&candidates[0]);
        Ok(chosen.clone())
    }

    fn name(&self) -> &'static str {
        "consistent_hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::test_support::instances;

    #[test]
    fn test_same_key_same_instance() {
        let balancer = ConsistentHashBalance::new();
        let candidates = instances(4);
        let first = balancer.choose_one_keyed("svc", &candidates, "user-42").unwrap();
        for _ in 0..10 {
            assert_eq!(balancer.choose_one_keyed("svc", &candidates, "user-42").unwrap(), first);
        }

        // order of the candidate list does not matter
        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(balancer.choose_one_keyed("svc", &reversed, "user-42").unwrap(), first);
    }

    #[test]
    fn test_removal_only_moves_keys_of_removed_instance() {
        let balancer = ConsistentHashBalance::new();
        let candidates = instances(5);
        let keys: Vec<String> = (0..200).map(|i| format!("key-{}", i)).collect();
        let before: Vec<ServiceInfo> = keys
            .iter()
            .map(|k| balancer.choose_one_keyed("svc", &candidates, k).unwrap())
            .collect();

        let removed = candidates[2].clone();
        let remaining: Vec<ServiceInfo> = candidates.into_iter().filter(|c| *c != removed).collect();
        for (key, previous) in keys.iter().zip(&before) {
            let now = balancer.choose_one_keyed("svc", &remaining, key).unwrap();
            if *previous != removed {
                assert_eq!(&now, previous, "key {} moved needlessly", key);
            }
        }
    }

    #[test]
    fn test_keys_spread_over_instances() {
        let balancer = ConsistentHashBalance::new();
        let candidates = instances(3);
        let hit: std::collections::HashSet<String> = (0..300)
            .map(|i| balancer.choose_one_keyed("svc", &candidates, &format!("k{}", i)).unwrap().host)
            .collect();
        assert_eq!(hit.len(), 3);
    }

    #[test]
    fn test_ring_is_cached_until_candidates_change() {
        let balancer = ConsistentHashBalance::new();
        let candidates = instances(2);
        let ring = balancer.ring_for("svc", &candidates);
        assert!(Arc::ptr_eq(&ring, &balancer.ring_for("svc", &candidates)));
        assert_eq!(ring.points.len(), 2 * VIRTUAL_NODES);

        let grown = instances(3);
        assert!(!Arc::ptr_eq(&ring, &balancer.ring_for("svc", &grown)));
    }
}
