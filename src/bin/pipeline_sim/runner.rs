// Scenario Runner — N seeded runs per scenario with statistical aggregation
// Seeds base..base+N drive the rate jitter; zero jitter makes every run identical

use backpressure_engine::*;

use crate::report::*;
use crate::scenarios::{RunOutcome, Scenario};
use crate::time_series::TimeSeriesRecorder;
use crate::traffic::RateJitter;

use std::path::Path;
use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    params: ModelParams,
    seed: u64,
    jitter: f64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<RunResult> {
    let start = Instant::now();
    let mut sim = PipelineSimulation::with_params(scenario.input, params)?;
    sim.set_policy(scenario.policy);

    let mut rates = RateJitter::new(seed, jitter);
    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());

    for tick in 0..scenario.ticks {
        let rate = match scenario.rate_curve {
            Some(curve) => curve(tick),
            None => scenario.input.target_rate,
        };
        sim.set_input(SimulationInput { target_rate: rates.apply(rate), ..sim.input() });

        // Control events (scale out, switch database)
        if let Some(event) = &scenario.mid_event {
            event(&mut sim, tick);
        }

        let result = sim.tick_core();
        if let Some(ts) = time_series.as_mut() {
            ts.record(&result);
        }
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(scenario.name).join(format!("seed-{}.jsonl", seed));
        if let Err(err) = ts.write_jsonl(&path) {
            tracing::warn!(path = %path.display(), %err, "failed to write time series");
        }
    }

    let stats = sim.stats();
    let outcome = RunOutcome {
        final_backlog: stats.current_backlog,
        peak_lag: stats.peak_lag,
        stalled_ticks: stats.stalled_ticks,
        avg_processed: stats.avg_processed_rate,
    };
    let violations = scenario.criteria.violations(&outcome);
    if !violations.is_empty() {
        tracing::debug!(scenario = scenario.name, seed, ?violations, "run failed");
    }

    Ok(RunResult {
        scenario: scenario.name.to_string(),
        seed,
        pass: violations.is_empty(),
        violations,
        ticks: stats.ticks,
        final_backlog: stats.current_backlog,
        peak_lag: stats.peak_lag,
        stalled_ticks: stats.stalled_ticks,
        overflowing_ticks: stats.overflowing_ticks,
        jittered_ticks: rates.perturbed_ticks,
        total_admitted: stats.total_admitted,
        total_processed: stats.total_processed,
        total_rejected: stats.total_rejected,
        avg_processed_rate: stats.avg_processed_rate,
        elapsed_us: start.elapsed().as_micros(),
    })
}

/// Run `runs` iterations of a scenario and aggregate them.
pub fn run_scenario(
    scenario: &Scenario,
    params: ModelParams,
    runs: usize,
    base_seed: u64,
    jitter: f64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<ScenarioReport> {
    let results = (0..runs as u64)
        .map(|i| run_single(scenario, params, base_seed.wrapping_add(i), jitter, time_series_dir))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ScenarioReport::from_runs(
        scenario.name,
        scenario.label,
        scenario.category,
        scenario.policy.as_str(),
        results,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::scenarios;

    fn find(name: &str) -> Scenario {
        scenarios()
            .into_iter()
            .find(|s| s.name == name)
            .expect("test: scenario exists")
    }

    #[test]
    fn every_builtin_scenario_passes_without_jitter() {
        for scenario in scenarios() {
            let report = run_scenario(&scenario, ModelParams::default(), 1, 0, 0.0, None)
                .expect("test: run scenario");
            assert!(
                report.passed(),
                "{} failed: {:?}",
                scenario.name,
                report.individual_runs[0].violations
            );
        }
    }

    #[test]
    fn full_stall_scenario_counts_every_tick() {
        let result = run_single(&find("PG_FULL_STALL"), ModelParams::default(), 0, 0.0, None)
            .expect("test: run");
        assert_eq!(result.ticks, 60);
        assert_eq!(result.stalled_ticks, 60);
        assert_eq!(result.total_processed, 0);
    }

    #[test]
    fn same_seed_reproduces_jittered_run() {
        let scenario = find("RAMP_POSTGRES");
        let a = run_single(&scenario, ModelParams::default(), 9, 0.2, None).expect("test: run");
        let b = run_single(&scenario, ModelParams::default(), 9, 0.2, None).expect("test: run");
        assert_eq!(a.peak_lag, b.peak_lag);
        assert_eq!(a.total_admitted, b.total_admitted);
        assert!(a.jittered_ticks > 0);
    }
}
