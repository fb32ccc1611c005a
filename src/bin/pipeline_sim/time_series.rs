// Per-Tick JSONL Time Series Recorder
// Outputs one JSON line per tick for plotting lag against controls

use serde::Serialize;
use backpressure_engine::{LagSource, SinkState, TickResult};
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub target_rate: u64,
    pub database_mode: &'static str,
    pub broker_count: u32,
    pub executor_count: u32,
    pub actual_sent: u64,
    pub processed_rate: u64,
    pub unified_lag: u64,
    pub backlog: u64,
    pub lag_source: LagSource,
    pub sink_state: SinkState,
    pub full_db_stall: bool,
    pub broker_utilization: u8,
    pub processing_utilization: u8,
    pub batch_duration: f64,
}

impl TickSnapshot {
    pub fn from_result(result: &TickResult) -> Self {
        let e = &result.evaluation;
        Self {
            tick: result.tick,
            target_rate: result.input.target_rate,
            database_mode: result.input.database_mode.as_str(),
            broker_count: result.input.broker_count,
            executor_count: result.input.executor_count,
            actual_sent: e.state.actual_sent,
            processed_rate: e.state.processed_rate,
            unified_lag: e.state.unified_lag,
            backlog: result.backlog,
            lag_source: e.state.lag_source,
            sink_state: e.tiers.sink,
            full_db_stall: e.state.full_db_stall,
            broker_utilization: e.metrics.broker_utilization,
            processing_utilization: e.metrics.processing_utilization,
            batch_duration: e.metrics.batch_duration,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<TickSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, result: &TickResult) {
        self.snapshots.push(TickSnapshot::from_result(result));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for snapshot in &self.snapshots {
            serde_json::to_writer(&mut file, snapshot)?;
            writeln!(file)?;
        }
        file.flush()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backpressure_engine::PipelineSimulation;

    #[test]
    fn snapshot_mirrors_tick_result() {
        let mut sim = PipelineSimulation::new();
        sim.set_target_rate(60_000.0);
        let snap = TickSnapshot::from_result(&sim.tick_core());
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.database_mode, "postgres");
        assert!(snap.full_db_stall);
        assert_eq!(snap.sink_state, SinkState::SinkStalled);
        assert_eq!(snap.backlog, 20_000);
    }

    #[test]
    fn jsonl_has_one_line_per_tick() {
        let mut sim = PipelineSimulation::new();
        let mut recorder = TimeSeriesRecorder::new();
        for _ in 0..5 {
            recorder.record(&sim.tick_core());
        }
        assert_eq!(recorder.len(), 5);

        let path = std::env::temp_dir().join(format!("pipeline-sim-ts-{}.jsonl", std::process::id()));
        recorder.write_jsonl(&path).expect("test: write jsonl");
        let contents = std::fs::read_to_string(&path).expect("test: read jsonl");
        std::fs::remove_file(&path).ok();

        assert_eq!(contents.lines().count(), 5);
        let first: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(first["tick"], 1);
        assert_eq!(first["lag_source"], "none");
    }
}
