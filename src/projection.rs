// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Derived Metrics Projector

use crate::config::ModelParams;
use crate::types::{CapacityProfile, PipelineState, TierOverflow, UserMetrics};

/// Turn the propagated state into the quantities the renderer displays.
pub fn project(
    state: &PipelineState,
    capacity: &CapacityProfile,
    overflow: &TierOverflow,
    params: &ModelParams,
) -> UserMetrics {
    let broker_throughput = state.actual_sent.min(capacity.broker_capacity);
    UserMetrics {
        actual_sent: state.actual_sent,
        broker_throughput,
        unified_lag: state.unified_lag,
        processed_rate: state.processed_rate,
        broker_utilization: utilization_pct(broker_throughput, capacity.broker_capacity),
        processing_utilization: utilization_pct(state.processed_rate, capacity.processing_capacity),
        batch_duration: batch_duration(state, overflow, params),
    }
}

/// `round(used / capacity * 100)`, clamped to `[0, 100]`.
///
/// A zero capacity reports zero rather than dividing by it.
pub fn utilization_pct(used: u64, capacity: u64) -> u8 {
    if capacity == 0 {
        return 0;
    }
    let pct = (used as f64 / capacity as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Batch window under backpressure, in seconds.
///
/// Sink-driven growth is capped tighter than processing-driven growth.
pub fn batch_duration(state: &PipelineState, overflow: &TierOverflow, params: &ModelParams) -> f64 {
    let grown = |lag: u64| params.base_batch_secs + lag as f64 * params.batch_growth_per_message;

    if state.full_db_stall {
        params.stall_batch_secs
    } else if overflow.sink_overflow > 0 {
        grown(overflow.sink_overflow).min(params.sink_batch_cap_secs)
    } else if overflow.processing_overflow > 0 {
        grown(overflow.processing_overflow).min(params.processing_batch_cap_secs)
    } else {
        params.base_batch_secs
    }
}
