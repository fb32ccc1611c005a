// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Write-Speed Policy

//! Sink ingestion speed as a function of database mode and incoming rate.
//!
//! Postgres is a three-region step function: full speed, degraded (a
//! fraction of the incoming rate), then a full stall. MongoDB is modelled as
//! a store that always keeps up.

use crate::config::ModelParams;
use crate::overflow::excess;
use crate::types::{DatabaseMode, SinkState};

/// Rate at which the sink accepts writes, msg/s.
pub fn write_speed(target_rate: u64, mode: DatabaseMode, params: &ModelParams) -> u64 {
    match sink_state(target_rate, mode, params) {
        SinkState::Nominal => target_rate,
        SinkState::SinkDegraded => (target_rate as f64 * params.degraded_write_factor).floor() as u64,
        SinkState::SinkStalled => 0,
    }
}

/// Region of the write-speed step function the sink is in.
pub fn sink_state(target_rate: u64, mode: DatabaseMode, params: &ModelParams) -> SinkState {
    match mode {
        DatabaseMode::MongoDb => SinkState::Nominal,
        DatabaseMode::Postgres if target_rate <= params.postgres_degrade_threshold => {
            SinkState::Nominal
        }
        DatabaseMode::Postgres if target_rate <= params.postgres_stall_threshold => {
            SinkState::SinkDegraded
        }
        DatabaseMode::Postgres => SinkState::SinkStalled,
    }
}

pub fn sink_overflow(target_rate: u64, write_speed: u64) -> u64 {
    excess(target_rate, write_speed)
}
