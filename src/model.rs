// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Capacity Model

//! The Capacity Model: one pure pass through the pipeline.
//!
//! Calculator → Overflow Evaluator → Write-Speed Policy → Backpressure
//! Propagator → Metrics Projector. Nothing here keeps state between calls.

use crate::config::ModelParams;
use crate::types::{Evaluation, SimulationInput, TierOverflow, TierState, TierStates};
use crate::{capacity, overflow, projection, propagation, sink};

/// Evaluate `input` with the default model parameters.
pub fn evaluate(input: &SimulationInput) -> Evaluation {
    evaluate_with(input, &ModelParams::default())
}

pub fn evaluate_with(input: &SimulationInput, params: &ModelParams) -> Evaluation {
    let rate = input.target_rate;
    let capacity = capacity::compute(input.broker_count, input.executor_count, params);
    let tier_excess = overflow::compute(rate, &capacity);

    let write_speed = sink::write_speed(rate, input.database_mode, params);
    let tier_overflow = TierOverflow {
        broker_overflow: tier_excess.broker_overflow,
        processing_overflow: tier_excess.processing_overflow,
        write_speed,
        sink_overflow: sink::sink_overflow(rate, write_speed),
    };

    let state = propagation::propagate(rate, &capacity, &tier_overflow);
    let metrics = projection::project(&state, &capacity, &tier_overflow, params);

    tracing::trace!(
        target_rate = rate,
        db = %input.database_mode,
        brokers = input.broker_count,
        executors = input.executor_count,
        lag = state.unified_lag,
        processed = state.processed_rate,
        "evaluated pipeline"
    );

    Evaluation {
        capacity,
        overflow: tier_overflow,
        state,
        metrics,
        tiers: TierStates {
            broker: TierState::from_overflow(tier_overflow.broker_overflow),
            processing: TierState::from_overflow(tier_overflow.processing_overflow),
            sink: sink::sink_state(rate, input.database_mode, params),
        },
    }
}
