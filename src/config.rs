// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Model Parameters

//! Tunable constants of the flow-control model.
//!
//! [`ModelParams::default`] reproduces the classroom model exactly. Every
//! field is optional when loading from JSON, so a parameter file only needs
//! to name the values it changes.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Throughput contributed by one broker, msg/s.
pub const BROKER_UNIT_CAPACITY: u64 = 50_000;
/// Throughput contributed by one executor, msg/s.
pub const EXECUTOR_UNIT_CAPACITY: u64 = 40_000;
/// Postgres writes at full speed up to this rate.
pub const POSTGRES_DEGRADE_THRESHOLD: u64 = 25_000;
/// Postgres stops writing above this rate.
pub const POSTGRES_STALL_THRESHOLD: u64 = 50_000;
pub const DEGRADED_WRITE_FACTOR: f64 = 0.5;
/// Seconds added to the batch window per lagged message.
pub const BATCH_GROWTH_PER_MESSAGE: f64 = 0.0005;
pub const BASE_BATCH_SECS: f64 = 1.0;
pub const STALL_BATCH_SECS: f64 = 30.0;
pub const SINK_BATCH_CAP_SECS: f64 = 30.0;
pub const PROCESSING_BATCH_CAP_SECS: f64 = 60.0;
/// Every batch window the model reports lies in `[MIN_BATCH_SECS, MAX_BATCH_SECS]`.
pub const MIN_BATCH_SECS: f64 = 1.0;
pub const MAX_BATCH_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelParams {
    pub broker_unit_capacity: u64,
    pub executor_unit_capacity: u64,
    pub postgres_degrade_threshold: u64,
    pub postgres_stall_threshold: u64,
    /// Fraction of the incoming rate Postgres writes while degraded.
    pub degraded_write_factor: f64,
    pub batch_growth_per_message: f64,
    pub base_batch_secs: f64,
    pub stall_batch_secs: f64,
    /// Cap on the batch window when the sink is the bottleneck.
    pub sink_batch_cap_secs: f64,
    /// Cap on the batch window when only the processing tier saturates.
    pub processing_batch_cap_secs: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            broker_unit_capacity: BROKER_UNIT_CAPACITY,
            executor_unit_capacity: EXECUTOR_UNIT_CAPACITY,
            postgres_degrade_threshold: POSTGRES_DEGRADE_THRESHOLD,
            postgres_stall_threshold: POSTGRES_STALL_THRESHOLD,
            degraded_write_factor: DEGRADED_WRITE_FACTOR,
            batch_growth_per_message: BATCH_GROWTH_PER_MESSAGE,
            base_batch_secs: BASE_BATCH_SECS,
            stall_batch_secs: STALL_BATCH_SECS,
            sink_batch_cap_secs: SINK_BATCH_CAP_SECS,
            processing_batch_cap_secs: PROCESSING_BATCH_CAP_SECS,
        }
    }
}

impl ModelParams {
    /// Parse and validate parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject parameter sets the model functions cannot evaluate totally.
    ///
    /// Unit capacities must be positive so utilization never divides by zero.
    /// Batch timings must keep every reported window inside
    /// `[MIN_BATCH_SECS, MAX_BATCH_SECS]`.
    pub fn validate(&self) -> Result<()> {
        if self.broker_unit_capacity == 0 {
            return Err(invalid("broker_unit_capacity", "must be positive"));
        }
        if self.executor_unit_capacity == 0 {
            return Err(invalid("executor_unit_capacity", "must be positive"));
        }
        if self.postgres_stall_threshold < self.postgres_degrade_threshold {
            return Err(invalid(
                "postgres_stall_threshold",
                format!(
                    "{} is below postgres_degrade_threshold {}",
                    self.postgres_stall_threshold, self.postgres_degrade_threshold
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.degraded_write_factor) {
            return Err(invalid("degraded_write_factor", "must lie in [0, 1]"));
        }
        if !self.batch_growth_per_message.is_finite() || self.batch_growth_per_message < 0.0 {
            return Err(invalid("batch_growth_per_message", "must be finite and non-negative"));
        }
        if !self.base_batch_secs.is_finite() || self.base_batch_secs < MIN_BATCH_SECS {
            return Err(invalid("base_batch_secs", format!("must be finite and at least {MIN_BATCH_SECS}")));
        }
        for (field, value) in [
            ("stall_batch_secs", self.stall_batch_secs),
            ("sink_batch_cap_secs", self.sink_batch_cap_secs),
            ("processing_batch_cap_secs", self.processing_batch_cap_secs),
        ] {
            if !value.is_finite() || value < self.base_batch_secs || value > MAX_BATCH_SECS {
                return Err(invalid(
                    field,
                    format!("must lie between base_batch_secs and {MAX_BATCH_SECS}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SimError {
    SimError::InvalidParams {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ModelParams::default().validate().expect("test: defaults validate");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let params = ModelParams::from_json(r#"{ "broker_unit_capacity": 75000 }"#)
            .expect("test: partial params parse");
        assert_eq!(params.broker_unit_capacity, 75_000);
        assert_eq!(params.executor_unit_capacity, EXECUTOR_UNIT_CAPACITY);
        assert_eq!(params.stall_batch_secs, STALL_BATCH_SECS);
    }

    #[test]
    fn zero_unit_capacity_rejected() {
        let err = ModelParams::from_json(r#"{ "executor_unit_capacity": 0 }"#).unwrap_err();
        assert!(
            matches!(err, SimError::InvalidParams { field: "executor_unit_capacity", .. }),
            "expected InvalidParams, got {err:?}"
        );
    }

    #[test]
    fn inverted_postgres_thresholds_rejected() {
        let params = ModelParams {
            postgres_degrade_threshold: 60_000,
            postgres_stall_threshold: 50_000,
            ..ModelParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn write_factor_out_of_range_rejected() {
        let params = ModelParams {
            degraded_write_factor: 1.5,
            ..ModelParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn batch_cap_below_base_rejected() {
        let params = ModelParams {
            sink_batch_cap_secs: 0.5,
            ..ModelParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn batch_bounds_above_sixty_seconds_rejected() {
        for json in [
            r#"{ "stall_batch_secs": 500.0 }"#,
            r#"{ "sink_batch_cap_secs": 60.5 }"#,
            r#"{ "processing_batch_cap_secs": 120.0 }"#,
        ] {
            let err = ModelParams::from_json(json).unwrap_err();
            assert!(matches!(err, SimError::InvalidParams { .. }), "{json}: {err:?}");
        }
    }

    #[test]
    fn base_batch_below_one_second_rejected() {
        let params = ModelParams {
            base_batch_secs: 0.5,
            ..ModelParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimError::InvalidParams { field: "base_batch_secs", .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ModelParams::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SimError::ParamsParse(_)));
    }
}
