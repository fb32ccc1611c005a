// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator

pub mod types;
pub mod error;
pub mod config;
pub mod capacity;
pub mod overflow;
pub mod sink;
pub mod propagation;
pub mod projection;
pub mod model;
pub mod simulation;
#[cfg(any(target_arch = "wasm32", test))]
mod console;

pub use types::*;
pub use error::{Result, SimError};
pub use config::ModelParams;
pub use model::{evaluate, evaluate_with};
pub use simulation::PipelineSimulation;

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl PipelineSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            console::install();
        }

        Self::default()
    }

    /// Construct with model parameters given as JSON. Missing fields keep
    /// their defaults.
    #[wasm_bindgen(js_name = withParamsJson)]
    pub fn with_params_json(json: &str) -> std::result::Result<PipelineSimulation, JsError> {
        #[cfg(target_arch = "wasm32")]
        {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            console::install();
        }

        let params = ModelParams::from_json(json)?;
        Ok(Self::with_params(SimulationInput::default(), params)?)
    }

    pub fn tick(&mut self) -> JsValue {
        let result = self.tick_core();
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    pub fn evaluate(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.evaluate_core()).unwrap_or(JsValue::NULL)
    }

    pub fn get_input(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.input).unwrap_or(JsValue::NULL)
    }

    pub fn get_stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.stats()).unwrap_or(JsValue::NULL)
    }

    /// Slider value in msg/s. Negative or non-finite values read as zero.
    pub fn set_target_rate(&mut self, rate: f64) {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate.round() as u64
        } else {
            if rate != 0.0 {
                tracing::warn!(rate, "invalid target rate, using 0");
            }
            0
        };
        self.input.target_rate = rate;
    }

    /// Accepts `"postgres"` or `"mongodb"`. Anything else keeps the current
    /// mode and returns `false`.
    pub fn set_database_mode(&mut self, mode: &str) -> bool {
        match mode.parse::<DatabaseMode>() {
            Ok(mode) => {
                self.input.database_mode = mode;
                true
            }
            Err(err) => {
                tracing::warn!(%err, keep = %self.input.database_mode, "rejected database mode");
                false
            }
        }
    }

    pub fn set_backlog_policy(&mut self, policy: &str) -> bool {
        match policy.parse::<BacklogPolicy>() {
            Ok(policy) => {
                self.set_policy(policy);
                true
            }
            Err(err) => {
                tracing::warn!(%err, keep = %self.policy, "rejected backlog policy");
                false
            }
        }
    }

    pub fn set_broker_count(&mut self, count: u32) {
        self.set_input(SimulationInput { broker_count: count, ..self.input });
    }

    pub fn set_executor_count(&mut self, count: u32) {
        self.set_input(SimulationInput { executor_count: count, ..self.input });
    }

    pub fn add_broker(&mut self) {
        self.input.broker_count = self.input.broker_count.saturating_add(1);
    }

    /// Never goes below one broker.
    pub fn remove_broker(&mut self) {
        self.input.broker_count = self.input.broker_count.saturating_sub(1).max(1);
    }

    pub fn add_executor(&mut self) {
        self.input.executor_count = self.input.executor_count.saturating_add(1);
    }

    pub fn remove_executor(&mut self) {
        self.input.executor_count = self.input.executor_count.saturating_sub(1).max(1);
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn get_backlog(&self) -> f64 {
        self.backlog as f64
    }

    /// Run N ticks without returning results
    pub fn run_batch(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick_core();
        }
    }

    /// Reset the clock and backlog. Pending input, parameters and policy are kept.
    pub fn reset(&mut self) {
        *self = PipelineSimulation::with_state(self.input, self.params, self.policy);
    }
}
