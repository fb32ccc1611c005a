// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Backpressure Propagator

//! Resolves the three per-tier overflow signals into one unified lag and
//! derives the downstream rates.
//!
//! Two ordered decisions drive everything here:
//!
//! 1. **Lag source.** Processing overflow dominates. Only when the
//!    processing tier keeps up does the lag fall back to the larger of broker
//!    and sink overflow.
//! 2. **Processing regime.** Full sink stall, then processing saturation,
//!    then steady state. Each branch's formula is only valid once every
//!    earlier branch has been ruled out.

use crate::types::{
    CapacityProfile, LagSource, PipelineState, ProcessingRegime, TierOverflow,
};

/// Pick the overflow that becomes the unified lag.
pub fn lag_source(overflow: &TierOverflow) -> LagSource {
    if overflow.processing_overflow > 0 {
        LagSource::Processing
    } else if overflow.broker_overflow == 0 && overflow.sink_overflow == 0 {
        LagSource::None
    } else if overflow.broker_overflow >= overflow.sink_overflow {
        LagSource::Broker
    } else {
        LagSource::Sink
    }
}

pub fn unified_lag(overflow: &TierOverflow) -> u64 {
    match lag_source(overflow) {
        LagSource::None => 0,
        LagSource::Processing => overflow.processing_overflow,
        LagSource::Broker => overflow.broker_overflow,
        LagSource::Sink => overflow.sink_overflow,
    }
}

/// The sink accepts nothing while demand is still arriving.
///
/// Only reachable under Postgres: MongoDB's write speed equals demand.
pub fn is_full_db_stall(overflow: &TierOverflow) -> bool {
    overflow.sink_overflow > 0 && overflow.write_speed == 0
}

pub fn processing_regime(overflow: &TierOverflow) -> ProcessingRegime {
    if is_full_db_stall(overflow) {
        ProcessingRegime::Stalled
    } else if overflow.processing_overflow > 0 {
        ProcessingRegime::Saturated
    } else {
        ProcessingRegime::Steady
    }
}

/// Combine tier overflows into the unified [`PipelineState`].
///
/// Messages the broker tier rejects are dropped from the simulation; no
/// retry or redelivery is modelled.
pub fn propagate(
    target_rate: u64,
    capacity: &CapacityProfile,
    overflow: &TierOverflow,
) -> PipelineState {
    let lag_source = lag_source(overflow);
    let unified_lag = unified_lag(overflow);
    let actual_sent = target_rate.saturating_sub(overflow.broker_overflow);
    let regime = processing_regime(overflow);

    let processed_rate = match regime {
        ProcessingRegime::Stalled => 0,
        ProcessingRegime::Saturated => capacity.processing_capacity,
        ProcessingRegime::Steady => actual_sent
            .saturating_sub(unified_lag)
            .min(capacity.processing_capacity),
    };

    PipelineState {
        unified_lag,
        actual_sent,
        processed_rate,
        full_db_stall: regime == ProcessingRegime::Stalled,
        lag_source,
        processing_regime: regime,
    }
}
