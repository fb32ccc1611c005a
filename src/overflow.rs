// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Overflow Evaluator

use serde::{Deserialize, Serialize};

use crate::types::CapacityProfile;

/// Excess demand at the two sized tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapacityOverflow {
    pub broker_overflow: u64,
    pub processing_overflow: u64,
}

/// `max(0, demand - capacity)`.
pub fn excess(demand: u64, capacity: u64) -> u64 {
    demand.saturating_sub(capacity)
}

pub fn compute(target_rate: u64, capacity: &CapacityProfile) -> CapacityOverflow {
    CapacityOverflow {
        broker_overflow: excess(target_rate, capacity.broker_capacity),
        processing_overflow: excess(target_rate, capacity.processing_capacity),
    }
}
