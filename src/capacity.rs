// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Capacity Calculator

use crate::config::ModelParams;
use crate::types::CapacityProfile;

/// Convert cluster sizing into absolute throughput ceilings.
///
/// Counts below one are treated as one, so both capacities are strictly
/// positive for any valid [`ModelParams`].
pub fn compute(broker_count: u32, executor_count: u32, params: &ModelParams) -> CapacityProfile {
    let brokers = u64::from(broker_count.max(1));
    let executors = u64::from(executor_count.max(1));
    CapacityProfile {
        broker_capacity: params.broker_unit_capacity.saturating_mul(brokers),
        processing_capacity: params.executor_unit_capacity.saturating_mul(executors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_node_clusters() {
        let profile = compute(1, 1, &ModelParams::default());
        assert_eq!(profile.broker_capacity, 50_000);
        assert_eq!(profile.processing_capacity, 40_000);
    }

    #[test]
    fn capacity_scales_linearly_with_nodes() {
        let profile = compute(3, 5, &ModelParams::default());
        assert_eq!(profile.broker_capacity, 150_000);
        assert_eq!(profile.processing_capacity, 200_000);
    }

    #[test]
    fn zero_counts_are_floored_to_one() {
        let profile = compute(0, 0, &ModelParams::default());
        assert_eq!(profile, compute(1, 1, &ModelParams::default()));
    }

    #[test]
    fn huge_unit_capacity_saturates() {
        let params = ModelParams {
            broker_unit_capacity: u64::MAX,
            ..ModelParams::default()
        };
        assert_eq!(compute(2, 1, &params).broker_capacity, u64::MAX);
    }
}
