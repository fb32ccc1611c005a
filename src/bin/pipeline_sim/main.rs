// Pipeline Simulator Runner — drive the backpressure model from the terminal
// Capacity Model snapshots, paced Backlog Model runs, seeded scenario suite
//
// Usage:
//   cargo run --bin pipeline-sim -- eval --rate 60000 --db postgres
//   cargo run --bin pipeline-sim -- run --ticks 120 --interval-ms 500 --policy accumulate
//   cargo run --bin pipeline-sim -- scenarios                   # All scenarios, 1 run each
//   cargo run --bin pipeline-sim -- scenarios PG --runs 30 --jitter 0.1 --seed 42
//   RUST_LOG=backpressure_engine=debug cargo run --bin pipeline-sim -- run --ticks 5

mod report;
mod runner;
mod scenarios;
mod time_series;
mod traffic;

use anyhow::Context;
use backpressure_engine::*;
use clap::{Args, Parser, Subcommand};
use report::*;
use scenarios::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use time_series::{TickSnapshot, TimeSeriesRecorder};

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pipeline-sim", version, about = "Backpressure pipeline simulator")]
struct Cli {
    /// JSON file overriding model parameters (capacities, thresholds, batch timing).
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the Capacity Model once.
    Eval {
        #[command(flatten)]
        input: InputArgs,
        /// Print the evaluation as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run the Backlog Model for a fixed number of ticks.
    Run {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 60)]
        ticks: u64,
        /// Real-time pause between ticks.
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
        #[arg(long, default_value = "recompute")]
        policy: BacklogPolicy,
        /// Write one JSON line per tick to this file.
        #[arg(long)]
        time_series: Option<PathBuf>,
        /// Print each tick as JSON instead of a table row.
        #[arg(long)]
        json: bool,
    },
    /// Run the built-in scenario suite.
    Scenarios {
        /// Case-insensitive match on scenario name, label or category.
        filter: Option<String>,
        #[arg(long, default_value_t = 1)]
        runs: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Relative rate jitter per tick, e.g. 0.1 for ±10%.
        #[arg(long, default_value_t = 0.0)]
        jitter: f64,
        /// Record per-run JSONL time series under sim-results/time-series/.
        #[arg(long)]
        time_series: bool,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Target production rate, msg/s.
    #[arg(long, default_value_t = 20)]
    rate: u64,
    /// Sink database: postgres or mongodb.
    #[arg(long, default_value = "postgres")]
    db: DatabaseMode,
    #[arg(long, default_value_t = 1)]
    brokers: u32,
    #[arg(long, default_value_t = 1)]
    executors: u32,
}

impl InputArgs {
    fn input(&self) -> SimulationInput {
        SimulationInput::new(self.rate, self.db, self.brokers, self.executors)
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let params = load_params(cli.params.as_deref())?;

    match cli.command {
        Command::Eval { input, json } => eval(input.input(), params, json),
        Command::Run { input, ticks, interval_ms, policy, time_series, json } => run(
            input.input(),
            params,
            policy,
            ticks,
            Duration::from_millis(interval_ms),
            time_series.as_deref(),
            json,
        ),
        Command::Scenarios { filter, runs, seed, jitter, time_series } => {
            let failed = run_suite(params, filter.as_deref(), runs, seed, jitter, time_series)?;
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load_params(path: Option<&Path>) -> anyhow::Result<ModelParams> {
    let Some(path) = path else {
        return Ok(ModelParams::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading params file {}", path.display()))?;
    let params = ModelParams::from_json(&json)
        .with_context(|| format!("loading params from {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded model params");
    Ok(params)
}

// ─── eval ───────────────────────────────────────────────────────────────────

fn eval(input: SimulationInput, params: ModelParams, json: bool) -> anyhow::Result<()> {
    let e = evaluate_with(&input, &params);

    if json {
        println!("{}", serde_json::to_string_pretty(&e)?);
        return Ok(());
    }

    println!("\n  Input");
    println!("    target rate          {:>12} msg/s", thousands(input.target_rate));
    println!("    database             {:>12}", input.database_mode);
    println!("    brokers / executors  {:>12}", format!("{} / {}", input.broker_count, input.executor_count));
    println!("\n  Capacity");
    println!("    broker               {:>12} msg/s", thousands(e.capacity.broker_capacity));
    println!("    processing           {:>12} msg/s", thousands(e.capacity.processing_capacity));
    println!("\n  Overflow");
    println!("    broker               {:>12}", thousands(e.overflow.broker_overflow));
    println!("    processing           {:>12}", thousands(e.overflow.processing_overflow));
    println!("    write speed          {:>12} msg/s", thousands(e.overflow.write_speed));
    println!("    sink                 {:>12}", thousands(e.overflow.sink_overflow));
    println!("\n  State");
    println!("    actual sent          {:>12} msg/s", thousands(e.state.actual_sent));
    println!("    processed            {:>12} msg/s", thousands(e.state.processed_rate));
    println!("    unified lag          {:>12} ({:?})", thousands(e.state.unified_lag), e.state.lag_source);
    println!("    processing regime    {:>12}", format!("{:?}", e.state.processing_regime));
    println!("    sink                 {:>12}", format!("{:?}", e.tiers.sink));
    println!("    full db stall        {:>12}", e.state.full_db_stall);
    println!("\n  Metrics");
    println!("    broker utilization   {:>11}%", e.metrics.broker_utilization);
    println!("    processing util.     {:>11}%", e.metrics.processing_utilization);
    println!("    batch duration       {:>11.1}s\n", e.metrics.batch_duration);
    Ok(())
}

// ─── run ────────────────────────────────────────────────────────────────────

fn run(
    input: SimulationInput,
    params: ModelParams,
    policy: BacklogPolicy,
    ticks: u64,
    interval: Duration,
    time_series: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let mut sim = PipelineSimulation::with_params(input, params)?;
    sim.set_policy(policy);
    let mut recorder = time_series.map(|_| TimeSeriesRecorder::new());

    if !json {
        println!("  {:>6} {:>10} {:>10} {:>12} {:>12} {:>11} {:>6}",
            "Tick", "Sent", "Processed", "Lag", "Backlog", "Source", "Stall");
        println!("  {}", "-".repeat(74));
    }

    for i in 0..ticks {
        if i > 0 && !interval.is_zero() {
            std::thread::sleep(interval);
        }
        let result = sim.tick_core();
        if json {
            println!("{}", serde_json::to_string(&TickSnapshot::from_result(&result))?);
        } else {
            let state = &result.evaluation.state;
            println!("  {:>6} {:>10} {:>10} {:>12} {:>12} {:>11} {:>6}",
                result.tick,
                thousands(state.actual_sent),
                thousands(state.processed_rate),
                thousands(state.unified_lag),
                thousands(result.backlog),
                format!("{:?}", state.lag_source),
                if state.full_db_stall { "yes" } else { "" },
            );
        }
        if let Some(ts) = recorder.as_mut() {
            ts.record(&result);
        }
    }

    if let (Some(ts), Some(path)) = (&recorder, time_series) {
        ts.write_jsonl(path)
            .with_context(|| format!("writing time series {}", path.display()))?;
        tracing::info!(path = %path.display(), ticks = ts.len(), "time series written");
    }

    let stats = sim.stats();
    if !json {
        println!("\n  Ticks: {}  Stalled: {}  Peak lag: {}  Final backlog: {}  Avg processed: {:.0} msg/s\n",
            stats.ticks,
            stats.stalled_ticks,
            thousands(stats.peak_lag),
            thousands(stats.current_backlog),
            stats.avg_processed_rate,
        );
    }
    Ok(())
}

// ─── scenarios ──────────────────────────────────────────────────────────────

/// Returns the number of failed scenarios.
fn run_suite(
    params: ModelParams,
    filter: Option<&str>,
    runs: usize,
    seed: u64,
    jitter: f64,
    time_series: bool,
) -> anyhow::Result<usize> {
    let all_scenarios = scenarios();
    let to_run: Vec<&Scenario> = match filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };
    anyhow::ensure!(!to_run.is_empty(), "no scenarios match filter {:?}", filter);

    let runs = runs.max(1);
    let results_dir = Path::new("sim-results");
    let ts_dir = time_series.then(|| results_dir.join("time-series"));

    println!("\n  Pipeline Scenario Suite");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {} | Jitter: ±{:.0}%",
        runs, seed, jitter * 100.0);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<42} {:>5} {:>12} {:>12} {:>8} {:>10}",
        "Scenario", "Pass%", "Peak lag", "Final", "Stalled", "Processed");
    println!("  {}", "-".repeat(94));

    let suite_start = Instant::now();
    let mut reports = Vec::new();

    for scenario in &to_run {
        let report = runner::run_scenario(scenario, params, runs, seed, jitter, ts_dir.as_deref())?;
        println!("  {:<42} {:>4}% {:>12} {:>12} {:>8.0} {:>10.0}  {}",
            report.label,
            (report.pass_rate * 100.0) as u32,
            thousands(report.peak_lag.mean as u64),
            thousands(report.final_backlog.mean as u64),
            report.stalled_ticks.mean,
            report.avg_processed_rate.mean,
            if report.passed() { "PASS" } else { "FAIL" },
        );
        if !report.passed() {
            for run in report.individual_runs.iter().filter(|r| !r.pass) {
                println!("      seed {}: {}", run.seed, run.violations.join("; "));
            }
        }
        reports.push(report);
    }

    let summary = Summary::from_reports(&reports);
    println!("  {}", "-".repeat(94));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.2}s\n",
        summary.total, summary.passed, summary.failed, suite_start.elapsed().as_secs_f64());

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis().to_string();
    let failed = summary.failed;
    let report = SuiteReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        runs_per_scenario: runs,
        base_seed: seed,
        jitter,
        summary,
        scenarios: reports,
    };

    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("creating {}", results_dir.display()))?;
    let path = results_dir.join(format!("run-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());

    Ok(failed)
}

/// `1234567` → `1,234,567`
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
