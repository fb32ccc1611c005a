// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Backlog Model

use wasm_bindgen::prelude::*;

use crate::config::ModelParams;
use crate::error::Result;
use crate::model;
use crate::types::*;

// ─── PipelineSimulation struct ───────────────────────────────────────────────

/// Owner of the Backlog Model clock.
///
/// Input setters only touch `input`; the lag is written exclusively by
/// [`PipelineSimulation::tick_core`], which reads whatever input is pending
/// at the start of the tick.
#[wasm_bindgen]
pub struct PipelineSimulation {
    pub(crate) input: SimulationInput,
    pub(crate) params: ModelParams,
    pub(crate) policy: BacklogPolicy,

    pub(crate) current_tick: u64,
    pub(crate) backlog: u64,
    pub(crate) last_sink_state: Option<SinkState>,

    pub(crate) stalled_ticks: u64,
    pub(crate) overflowing_ticks: u64,
    /// Peak carried backlog, not peak per-tick lag.
    pub(crate) peak_lag: u64,
    pub(crate) total_admitted: u64,
    pub(crate) total_processed: u64,
    pub(crate) total_rejected: u64,
}

impl Default for PipelineSimulation {
    fn default() -> Self {
        Self::with_state(SimulationInput::default(), ModelParams::default(), BacklogPolicy::default())
    }
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl PipelineSimulation {
    /// Start a simulation from explicit input and parameters.
    pub fn with_params(input: SimulationInput, params: ModelParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::with_state(input.clamped(), params, BacklogPolicy::default()))
    }

    pub(crate) fn with_state(input: SimulationInput, params: ModelParams, policy: BacklogPolicy) -> Self {
        Self {
            input,
            params,
            policy,
            current_tick: 0,
            backlog: 0,
            last_sink_state: None,
            stalled_ticks: 0,
            overflowing_ticks: 0,
            peak_lag: 0,
            total_admitted: 0,
            total_processed: 0,
            total_rejected: 0,
        }
    }

    /// Advance the clock by one tick and publish the resulting snapshot.
    pub fn tick_core(&mut self) -> TickResult {
        self.current_tick += 1;
        let input = self.input;
        let evaluation = model::evaluate_with(&input, &self.params);

        self.note_sink_transition(evaluation.tiers.sink);
        self.backlog = next_backlog(self.policy, self.backlog, &evaluation);
        self.record_stats(&input, &evaluation);

        tracing::debug!(
            tick = self.current_tick,
            policy = %self.policy,
            lag = evaluation.state.unified_lag,
            backlog = self.backlog,
            processed = evaluation.state.processed_rate,
            stalled = evaluation.state.full_db_stall,
            "tick"
        );

        TickResult {
            tick: self.current_tick,
            policy: self.policy,
            input,
            evaluation,
            backlog: self.backlog,
            lags: TierLags::uniform(self.backlog),
        }
    }

    /// Capacity Model view of the pending input. Leaves the backlog untouched.
    pub fn evaluate_core(&self) -> Evaluation {
        model::evaluate_with(&self.input, &self.params)
    }

    pub fn input(&self) -> SimulationInput {
        self.input
    }

    /// Replace the pending input. Takes effect on the next tick.
    pub fn set_input(&mut self, input: SimulationInput) {
        self.input = input.clamped();
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn policy(&self) -> BacklogPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: BacklogPolicy) {
        if policy != self.policy {
            tracing::info!(from = %self.policy, to = %policy, "backlog policy changed");
            self.policy = policy;
        }
    }

    pub fn backlog(&self) -> u64 {
        self.backlog
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            ticks: self.current_tick,
            stalled_ticks: self.stalled_ticks,
            overflowing_ticks: self.overflowing_ticks,
            peak_lag: self.peak_lag,
            current_backlog: self.backlog,
            total_admitted: self.total_admitted,
            total_processed: self.total_processed,
            total_rejected: self.total_rejected,
            avg_processed_rate: if self.current_tick > 0 {
                self.total_processed as f64 / self.current_tick as f64
            } else {
                0.0
            },
        }
    }

    fn note_sink_transition(&mut self, sink: SinkState) {
        if self.last_sink_state != Some(sink) {
            if let Some(previous) = self.last_sink_state {
                tracing::info!(
                    tick = self.current_tick,
                    from = ?previous,
                    to = ?sink,
                    "sink state changed"
                );
            }
            self.last_sink_state = Some(sink);
        }
    }

    fn record_stats(&mut self, input: &SimulationInput, evaluation: &Evaluation) {
        let state = &evaluation.state;
        if state.full_db_stall {
            self.stalled_ticks += 1;
        }
        if state.unified_lag > 0 {
            self.overflowing_ticks += 1;
        }
        self.peak_lag = self.peak_lag.max(self.backlog);
        self.total_admitted = self.total_admitted.saturating_add(state.actual_sent);
        self.total_processed = self.total_processed.saturating_add(state.processed_rate);
        self.total_rejected = self
            .total_rejected
            .saturating_add(input.target_rate.saturating_sub(state.actual_sent));
    }
}

// ─── Backlog Policy ──────────────────────────────────────────────────────────

/// Lag carried into the next tick.
///
/// `Accumulate` only drains on ticks where no tier overflows, at the rate of
/// the processing tier's spare capacity.
pub(crate) fn next_backlog(policy: BacklogPolicy, previous: u64, evaluation: &Evaluation) -> u64 {
    let lag = evaluation.state.unified_lag;
    match policy {
        BacklogPolicy::Recompute => lag,
        BacklogPolicy::Accumulate if lag > 0 => previous.saturating_add(lag),
        BacklogPolicy::Accumulate => {
            let headroom = evaluation
                .capacity
                .processing_capacity
                .saturating_sub(evaluation.state.processed_rate);
            previous.saturating_sub(headroom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim_at(rate: u64, db: DatabaseMode) -> PipelineSimulation {
        let mut sim = PipelineSimulation::default();
        sim.set_input(SimulationInput::new(rate, db, 1, 1));
        sim
    }

    #[test]
    fn recompute_overwrites_lag_each_tick() {
        let mut sim = sim_at(30_000, DatabaseMode::Postgres);
        sim.tick_core();
        let r = sim.tick_core();
        assert_eq!(r.backlog, 15_000);
        assert_eq!(r.lags, TierLags::uniform(15_000));

        sim.set_input(SimulationInput::new(20_000, DatabaseMode::Postgres, 1, 1));
        assert_eq!(sim.tick_core().backlog, 0);
    }

    #[test]
    fn accumulate_grows_then_drains() {
        let mut sim = sim_at(30_000, DatabaseMode::Postgres);
        sim.set_policy(BacklogPolicy::Accumulate);
        sim.tick_core();
        sim.tick_core();
        assert_eq!(sim.backlog(), 30_000);

        // 10k in, 40k capacity: 30k headroom drains it in one tick.
        sim.set_input(SimulationInput::new(10_000, DatabaseMode::Postgres, 1, 1));
        assert_eq!(sim.tick_core().backlog, 0);
        assert_eq!(sim.stats().peak_lag, 30_000);
    }

    #[test]
    fn accumulate_does_not_drain_while_stalled() {
        let mut sim = sim_at(60_000, DatabaseMode::Postgres);
        sim.set_policy(BacklogPolicy::Accumulate);
        for _ in 0..3 {
            sim.tick_core();
        }
        assert_eq!(sim.backlog(), 60_000);
        assert_eq!(sim.stats().stalled_ticks, 3);
    }

    #[test]
    fn input_changes_wait_for_next_tick() {
        let mut sim = sim_at(30_000, DatabaseMode::Postgres);
        sim.tick_core();
        sim.set_input(SimulationInput::new(60_000, DatabaseMode::Postgres, 1, 1));
        assert_eq!(sim.backlog(), 15_000);
        assert_eq!(sim.evaluate_core().state.unified_lag, 20_000);
        assert_eq!(sim.backlog(), 15_000);
    }

    #[test]
    fn stats_track_admitted_and_rejected() {
        let mut sim = sim_at(90_000, DatabaseMode::MongoDb);
        sim.tick_core();
        sim.tick_core();
        let stats = sim.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.total_admitted, 100_000);
        assert_eq!(stats.total_rejected, 80_000);
        assert_eq!(stats.total_processed, 80_000);
        assert_eq!(stats.avg_processed_rate, 40_000.0);
        assert_eq!(stats.overflowing_ticks, 2);
    }

    #[test]
    fn invalid_params_rejected_at_construction() {
        let params = ModelParams {
            broker_unit_capacity: 0,
            ..ModelParams::default()
        };
        assert!(PipelineSimulation::with_params(SimulationInput::default(), params).is_err());
    }
}
