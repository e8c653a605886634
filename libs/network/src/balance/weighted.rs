use super::{ensure_candidates, LoadBalance};
use crate::error::Result;
use crate::instance::ServiceInfo;
use rand::Rng;

/// Random selection proportional to instance weight
///
/// Zero-weight instances are never picked unless every weight is zero, in
/// which case selection is uniform.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedRandomBalance;

impl WeightedRandomBalance {
    fn pick(candidates: &[ServiceInfo], mut point: u64) -> usize {
        for (index, candidate) in candidates.iter().enumerate() {
            let weight = u64::from(candidate.weight);
            if point < weight {
                return index;
            }
            point -= weight;
        }
        candidates.len() - 1
    }
}

impl LoadBalance for WeightedRandomBalance {
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo> {
        ensure_candidates(service, candidates)?;

        let total: u64 = candidates.iter().map(|c| u64::from(c.weight)).sum();
        let mut rng = rand::thread_rng();
        let index = if total == 0 {
            rng.gen_range(0..candidates.len())
        } else {
            Self::pick(candidates, rng.gen_range(0..total))
        };
        Ok(candidates[index].clone())
    }

    fn name(&self) -> &'static str {
        "weighted_random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::test_support::instances;

    #[test]
    fn test_pick_walks_cumulative_weights() {
        let candidates = vec![
            ServiceInfo::new("svc", "a", 1).with_weight(2),
            ServiceInfo::new("svc", "b", 1).with_weight(0),
            ServiceInfo::new("svc", "c", 1).with_weight(3),
        ];
        assert_eq!(WeightedRandomBalance::pick(&candidates, 0), 0);
        assert_eq!(WeightedRandomBalance::pick(&candidates, 1), 0);
        assert_eq!(WeightedRandomBalance::pick(&candidates, 2), 2);
        assert_eq!(WeightedRandomBalance::pick(&candidates, 4), 2);
    }

    #[test]
    fn test_zero_weight_never_chosen() {
        let candidates = vec![
            ServiceInfo::new("svc", "live", 1).with_weight(5),
            ServiceInfo::new("svc", "drained", 1).with_weight(0),
        ];
        for _ in 0..200 {
            let picked = WeightedRandomBalance.choose_one("svc", &candidates).unwrap();
            assert_eq!(picked.host, "live");
        }
    }

    #[test]
    fn test_all_zero_falls_back_to_uniform() {
        let candidates: Vec<ServiceInfo> = instances(3).into_iter().map(|c| c.with_weight(0)).collect();
        let picked = WeightedRandomBalance.choose_one("svc", &candidates).unwrap();
        assert!(candidates.contains(&picked));
    }
}
