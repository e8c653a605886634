use super::{ensure_candidates, LoadBalance};
use crate::error::Result;
use crate::instance::ServiceInfo;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotates through the candidates, one counter per service
///
/// The counter is reduced modulo the current list length, so a list that
/// grows or shrinks between calls keeps rotating without going out of range.
#[derive(Debug, Default)]
pub struct RoundRobinBalance {
    counters: DashMap<String, AtomicUsize>,
}

impl RoundRobinBalance {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalance for RoundRobinBalance {
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo> {
        ensure_candidates(service, candidates)?;

        let existing = self
            .counters
            .get(service)
            .map(|counter| counter.fetch_add(1, Ordering::Relaxed));
        let position = match existing {
            Some(position) => position,
            None => self
                .counters
                .entry(service.to_string())
                .or_insert_with(|| AtomicUsize::new(0))
                .fetch_add(1, Ordering::Relaxed),
        };
        Ok(candidates[position % candidates.len()].clone())
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::test_support::instances;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_first_candidate() {
        let balancer = RoundRobinBalance::new();
        let candidates = instances(3);
        let hosts: Vec<String> = (0..4)
            .map(|_| balancer.choose_one("svc", &candidates).unwrap().host)
            .collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1"]);
    }

    #[test]
    fn test_services_rotate_independently() {
        let balancer = RoundRobinBalance::new();
        let candidates = instances(2);
        assert_eq!(balancer.choose_one("a", &candidates).unwrap().host, "10.0.0.1");
        assert_eq!(balancer.choose_one("b", &candidates).unwrap().host, "10.0.0.1");
        assert_eq!(balancer.choose_one("a", &candidates).unwrap().host, "10.0.0.2");
    }

    #[test]
    fn test_shrinking_list_stays_in_range() {
        let balancer = RoundRobinBalance::new();
        let large = instances(5);
        for _ in 0..4 {
            balancer.choose_one("svc", &large).unwrap();
        }
        let small = instances(2);
        let picked = balancer.choose_one("svc", &small).unwrap();
        assert!(small.contains(&picked));
    }

    proptest! {
        #[test]
        fn prop_two_rounds_visit_each_twice(n in 1usize..16) {
            let balancer = RoundRobinBalance::new();
            let candidates = instances(n);
            let picks: Vec<ServiceInfo> = (0..2 * n)
                .map(|_| balancer.choose_one("svc", &candidates).unwrap())
                .collect();

            for (i, pick) in picks.iter().enumerate() {
                prop_assert_eq!(pick, &candidates[i % n]);
            }
            for candidate in &candidates {
                prop_assert_eq!(picks.iter().filter(|p| *p == candidate).count(), 2);
            }
        }
    }
}
