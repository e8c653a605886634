use super::{ensure_candidates, LoadBalance};
use crate::error::Result;
use crate::instance::ServiceInfo;
use rand::Rng;

/// Uniform random selection
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBalance;

impl LoadBalance for RandomBalance {
    fn choose_one(&self, service: &str, candidates: &[ServiceInfo]) -> Result<ServiceInfo> {
        ensure_candidates(service, candidates)?;
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Ok(candidates[index].clone())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
