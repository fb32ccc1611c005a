// Scenario Definitions — classroom walkthroughs of backpressure
// Each scenario drives the Backlog Model with a rate curve and optional control events

use backpressure_engine::{BacklogPolicy, DatabaseMode, PipelineSimulation, SimulationInput};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub ticks: u64,
    pub input: SimulationInput,
    pub policy: BacklogPolicy,
    /// Target rate per tick; `None` holds `input.target_rate`.
    pub rate_curve: Option<fn(u64) -> u64>,
    /// Control changes at specific ticks (scale a cluster, switch database).
    pub mid_event: Option<Box<dyn Fn(&mut PipelineSimulation, u64) + Send + Sync>>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    pub min_final_backlog: Option<u64>,
    pub max_final_backlog: Option<u64>,
    pub min_peak_lag: Option<u64>,
    pub max_peak_lag: Option<u64>,
    pub require_stall: bool,
    pub forbid_stall: bool,
    pub max_avg_processed: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            min_final_backlog: None,
            max_final_backlog: None,
            min_peak_lag: None,
            max_peak_lag: None,
            require_stall: false,
            forbid_stall: false,
            max_avg_processed: None,
        }
    }
}

/// Outcome of a single run, checked against [`PassCriteria`].
pub struct RunOutcome {
    pub final_backlog: u64,
    pub peak_lag: u64,
    pub stalled_ticks: u64,
    pub avg_processed: f64,
}

impl PassCriteria {
    /// Names of the criteria the run violated. Empty means pass.
    pub fn violations(&self, run: &RunOutcome) -> Vec<String> {
        let mut failed = Vec::new();
        if let Some(min) = self.min_final_backlog {
            if run.final_backlog < min {
                failed.push(format!("final backlog {} < {}", run.final_backlog, min));
            }
        }
        if let Some(max) = self.max_final_backlog {
            if run.final_backlog > max {
                failed.push(format!("final backlog {} > {}", run.final_backlog, max));
            }
        }
        if let Some(min) = self.min_peak_lag {
            if run.peak_lag < min {
                failed.push(format!("peak lag {} < {}", run.peak_lag, min));
            }
        }
        if let Some(max) = self.max_peak_lag {
            if run.peak_lag > max {
                failed.push(format!("peak lag {} > {}", run.peak_lag, max));
            }
        }
        if self.require_stall && run.stalled_ticks == 0 {
            failed.push("expected a full sink stall".to_string());
        }
        if self.forbid_stall && run.stalled_ticks > 0 {
            failed.push(format!("sink stalled for {} ticks", run.stalled_ticks));
        }
        if let Some(max) = self.max_avg_processed {
            if run.avg_processed > max {
                failed.push(format!("avg processed {:.0} > {:.0}", run.avg_processed, max));
            }
        }
        failed
    }
}

// ─── Curve Functions ────────────────────────────────────────────────────────

/// Slider dragged from 0 to 100k, one step per tick.
fn ramp_to_max(tick: u64) -> u64 {
    (tick * 1_000).min(100_000)
}

/// Overload for 20 ticks, then back off to a rate the cluster can drain.
fn burst_then_relief(tick: u64) -> u64 {
    if tick < 20 { 60_000 } else { 10_000 }
}

/// Square wave across the Postgres degrade threshold.
fn flapping_sink(tick: u64) -> u64 {
    if (tick / 10) % 2 == 0 { 20_000 } else { 40_000 }
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

fn pg(rate: u64) -> SimulationInput {
    SimulationInput::new(rate, DatabaseMode::Postgres, 1, 1)
}

fn mongo(rate: u64) -> SimulationInput {
    SimulationInput::new(rate, DatabaseMode::MongoDb, 1, 1)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "NOMINAL_DEMO",
            label: "Demo start (20 msg/s)",
            category: "baseline",
            ticks: 60,
            input: SimulationInput::default(),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: None,
            criteria: PassCriteria {
                max_peak_lag: Some(0),
                forbid_stall: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "PG_DEGRADED",
            label: "Postgres half-speed writes",
            category: "sink",
            ticks: 60,
            input: pg(30_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: None,
            criteria: PassCriteria {
                min_final_backlog: Some(15_000),
                max_final_backlog: Some(15_000),
                forbid_stall: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "PG_FULL_STALL",
            label: "Postgres full stall",
            category: "sink",
            ticks: 60,
            input: pg(60_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: None,
            criteria: PassCriteria {
                require_stall: true,
                max_avg_processed: Some(0.0),
                ..Default::default()
            },
        },
        Scenario {
            name: "PG_FLAPPING",
            label: "Postgres flapping at threshold",
            category: "sink",
            ticks: 100,
            input: pg(20_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: Some(flapping_sink),
            mid_event: None,
            criteria: PassCriteria {
                min_peak_lag: Some(20_000),
                forbid_stall: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "MONGO_PROCESSING_BOUND",
            label: "MongoDB at 90k, processing bound",
            category: "processing",
            ticks: 60,
            input: mongo(90_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: None,
            criteria: PassCriteria {
                min_peak_lag: Some(50_000),
                max_peak_lag: Some(50_000),
                forbid_stall: true,
                ..Default::default()
            },
        },
        Scenario {
            name: "RAMP_POSTGRES",
            label: "Slider ramp 0 to 100k (Postgres)",
            category: "ramp",
            ticks: 120,
            input: pg(0),
            policy: BacklogPolicy::Recompute,
            rate_curve: Some(ramp_to_max),
            mid_event: None,
            criteria: PassCriteria {
                require_stall: true,
                min_peak_lag: Some(60_000),
                ..Default::default()
            },
        },
        Scenario {
            name: "SCALE_OUT_RECOVERY",
            label: "Scale out clusters at tick 30",
            category: "scaling",
            ticks: 60,
            input: mongo(90_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: Some(Box::new(|sim: &mut PipelineSimulation, tick: u64| {
                if tick == 30 {
                    sim.add_broker();
                    sim.add_executor();
                    sim.add_executor();
                }
            })),
            criteria: PassCriteria {
                max_final_backlog: Some(0),
                min_peak_lag: Some(50_000),
                ..Default::default()
            },
        },
        Scenario {
            name: "DB_SWITCH_RESCUE",
            label: "Switch Postgres to MongoDB mid-stall",
            category: "scaling",
            ticks: 60,
            input: pg(60_000),
            policy: BacklogPolicy::Recompute,
            rate_curve: None,
            mid_event: Some(Box::new(|sim: &mut PipelineSimulation, tick: u64| {
                if tick == 20 {
                    sim.set_database_mode("mongodb");
                    sim.add_executor();
                }
            })),
            criteria: PassCriteria {
                require_stall: true,
                min_final_backlog: Some(10_000),
                max_final_backlog: Some(10_000),
                ..Default::default()
            },
        },
        Scenario {
            name: "ACCUMULATE_DRAIN",
            label: "Backlog builds under stall, then drains",
            category: "backlog",
            ticks: 60,
            input: pg(60_000),
            policy: BacklogPolicy::Accumulate,
            rate_curve: Some(burst_then_relief),
            mid_event: None,
            criteria: PassCriteria {
                min_peak_lag: Some(400_000),
                max_final_backlog: Some(0),
                require_stall: true,
                ..Default::default()
            },
        },
    ]
}
