// Scenario Report Types
// Structured JSON output for the classroom scenario suite

use serde::Serialize;

// ─── Statistics (per-metric aggregation across seeded runs) ─────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub scenario: String,
    pub seed: u64,
    pub pass: bool,
    pub violations: Vec<String>,
    pub ticks: u64,
    pub final_backlog: u64,
    pub peak_lag: u64,
    pub stalled_ticks: u64,
    pub overflowing_ticks: u64,
    pub jittered_ticks: u64,
    pub total_admitted: u64,
    pub total_processed: u64,
    pub total_rejected: u64,
    pub avg_processed_rate: f64,
    pub elapsed_us: u128,
}

// ─── Per-Scenario Aggregation ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub policy: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub final_backlog: Stats,
    pub peak_lag: Stats,
    pub stalled_ticks: Stats,
    pub avg_processed_rate: Stats,
    pub individual_runs: Vec<RunResult>,
}

impl ScenarioReport {
    pub fn from_runs(
        name: &str,
        label: &str,
        category: &str,
        policy: &str,
        runs: Vec<RunResult>,
    ) -> Self {
        let n = runs.len();
        let passed = runs.iter().filter(|r| r.pass).count();
        let collect = |f: fn(&RunResult) -> f64| runs.iter().map(f).collect::<Vec<_>>();
        Self {
            scenario_name: name.to_string(),
            label: label.to_string(),
            category: category.to_string(),
            policy: policy.to_string(),
            n_runs: n,
            pass_rate: if n > 0 { passed as f64 / n as f64 } else { 0.0 },
            final_backlog: Stats::from_samples(&collect(|r| r.final_backlog as f64)),
            peak_lag: Stats::from_samples(&collect(|r| r.peak_lag as f64)),
            stalled_ticks: Stats::from_samples(&collect(|r| r.stalled_ticks as f64)),
            avg_processed_rate: Stats::from_samples(&collect(|r| r.avg_processed_rate)),
            individual_runs: runs,
        }
    }

    pub fn passed(&self) -> bool {
        self.n_runs > 0 && self.pass_rate >= 1.0
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub runs_per_scenario: usize,
    pub base_seed: u64,
    pub jitter: f64,
    pub summary: Summary,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

impl Summary {
    pub fn from_reports(reports: &[ScenarioReport]) -> Self {
        let total = reports.len();
        let passed = reports.iter().filter(|r| r.passed()).count();
        Self {
            total,
            passed,
            failed: total - passed,
            pass_rate: if total > 0 { passed as f64 / total as f64 } else { 0.0 },
        }
    }
}
