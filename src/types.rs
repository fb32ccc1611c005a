// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

// ─── Database Mode ───────────────────────────────────────────────────────────

/// Sink technology. Selects the write-speed policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    /// Relational store with a write ceiling.
    #[default]
    Postgres,
    /// Schemaless store, modelled with unlimited write capacity.
    #[serde(rename = "mongodb")]
    MongoDb,
}

impl DatabaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MongoDb => "mongodb",
        }
    }
}

impl fmt::Display for DatabaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DatabaseMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            _ => Err(SimError::UnknownDatabaseMode(s.to_string())),
        }
    }
}

// ─── Backlog Policy ──────────────────────────────────────────────────────────

/// How the Backlog Model carries lag from one tick to the next.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BacklogPolicy {
    /// Lag is overwritten with the latest unified lag every tick.
    #[default]
    Recompute,
    /// Lag grows by the unified lag each tick and drains by spare
    /// processing capacity once no tier overflows.
    Accumulate,
}

impl BacklogPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recompute => "recompute",
            Self::Accumulate => "accumulate",
        }
    }
}

impl fmt::Display for BacklogPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BacklogPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recompute" => Ok(Self::Recompute),
            "accumulate" => Ok(Self::Accumulate),
            _ => Err(SimError::UnknownBacklogPolicy(s.to_string())),
        }
    }
}

// ─── SimulationInput ─────────────────────────────────────────────────────────

/// Externally supplied controls. Immutable for the duration of one evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationInput {
    /// Requested producer throughput, msg/s.
    pub target_rate: u64,
    pub database_mode: DatabaseMode,
    pub broker_count: u32,
    pub executor_count: u32,
}

impl SimulationInput {
    /// Build an input, clamping both cluster sizes to at least one node.
    pub fn new(
        target_rate: u64,
        database_mode: DatabaseMode,
        broker_count: u32,
        executor_count: u32,
    ) -> Self {
        Self {
            target_rate,
            database_mode,
            broker_count,
            executor_count,
        }
        .clamped()
    }

    /// Copy of this input with `broker_count` and `executor_count` floored at 1.
    pub fn clamped(self) -> Self {
        if self.broker_count < 1 || self.executor_count < 1 {
            tracing::warn!(
                broker_count = self.broker_count,
                executor_count = self.executor_count,
                "cluster size below one node, clamping"
            );
        }
        Self {
            broker_count: self.broker_count.max(1),
            executor_count: self.executor_count.max(1),
            ..self
        }
    }
}

impl Default for SimulationInput {
    /// Initial controls of the demo: 20 msg/s into Postgres on a single
    /// broker and a single executor.
    fn default() -> Self {
        Self {
            target_rate: 20,
            database_mode: DatabaseMode::Postgres,
            broker_count: 1,
            executor_count: 1,
        }
    }
}

// ─── Derived Entities ────────────────────────────────────────────────────────

/// Absolute throughput ceilings of the broker and processing tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapacityProfile {
    pub broker_capacity: u64,
    pub processing_capacity: u64,
}

/// Excess demand at each tier. Zero means the tier is not backpressuring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TierOverflow {
    pub broker_overflow: u64,
    pub processing_overflow: u64,
    pub write_speed: u64,
    pub sink_overflow: u64,
}

/// Propagated result of one evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineState {
    pub unified_lag: u64,
    pub actual_sent: u64,
    pub processed_rate: u64,
    pub full_db_stall: bool,
    pub lag_source: LagSource,
    pub processing_regime: ProcessingRegime,
}

/// User-facing quantities projected from a [`PipelineState`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UserMetrics {
    pub actual_sent: u64,
    /// Broker throughput actually used, `min(actual_sent, broker_capacity)`.
    pub broker_throughput: u64,
    pub unified_lag: u64,
    pub processed_rate: u64,
    pub broker_utilization: u8,
    pub processing_utilization: u8,
    /// Seconds, within `[1, 60]` under default parameters.
    pub batch_duration: f64,
}

// ─── Per-tier States ─────────────────────────────────────────────────────────

/// Which overflow the unified lag was taken from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LagSource {
    /// No tier overflows.
    None,
    /// Processing overflow, which dominates every other signal.
    Processing,
    /// Broker overflow, at least as large as sink overflow.
    Broker,
    /// Sink overflow, strictly larger than broker overflow.
    Sink,
}

/// Branch taken when deriving the processed rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingRegime {
    /// Sink fully stalled: nothing proceeds.
    Stalled,
    /// Processing tier runs flat out at its ceiling.
    Saturated,
    /// Admitted traffic minus outstanding lag, capped by capacity.
    Steady,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkState {
    Nominal,
    SinkDegraded,
    SinkStalled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierState {
    UnderCapacity,
    Overflowing,
}

impl TierState {
    pub fn from_overflow(overflow: u64) -> Self {
        if overflow > 0 {
            Self::Overflowing
        } else {
            Self::UnderCapacity
        }
    }
}

/// Per-evaluation state machine view of the three tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierStates {
    pub broker: TierState,
    pub processing: TierState,
    pub sink: SinkState,
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Everything one pass through the model produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub capacity: CapacityProfile,
    pub overflow: TierOverflow,
    pub state: PipelineState,
    pub metrics: UserMetrics,
    pub tiers: TierStates,
}

// ─── Backlog Model Snapshots ─────────────────────────────────────────────────

/// Lag shown at each node of the pipeline graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TierLags {
    pub broker: u64,
    pub processor: u64,
    pub sink: u64,
}

impl TierLags {
    /// The unified lag is visible at every tier.
    pub fn uniform(lag: u64) -> Self {
        Self {
            broker: lag,
            processor: lag,
            sink: lag,
        }
    }
}

/// Immutable snapshot published by each Backlog Model tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickResult {
    pub tick: u64,
    pub policy: BacklogPolicy,
    pub input: SimulationInput,
    pub evaluation: Evaluation,
    /// Lag carried forward after this tick.
    pub backlog: u64,
    pub lags: TierLags,
}

/// Running counters over the life of a simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimStats {
    pub ticks: u64,
    pub stalled_ticks: u64,
    pub overflowing_ticks: u64,
    /// Largest backlog carried after any tick. Under `Recompute` this is the
    /// largest unified lag; under `Accumulate` it is the largest running total.
    pub peak_lag: u64,
    pub current_backlog: u64,
    pub total_admitted: u64,
    pub total_processed: u64,
    pub total_rejected: u64,
    pub avg_processed_rate: f64,
}
