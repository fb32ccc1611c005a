// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Backpressure Pipeline Simulator - Browser Console Logging

//! Routes `tracing` events to the browser console on wasm builds.
//!
//! Native builds install their own subscriber in the runner binary.

use std::io::Write;
use tracing_subscriber::fmt::MakeWriter;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

/// Buffers one formatted event and hands it to `sink` as a single line.
pub(crate) struct ConsoleWriter {
    buf: Vec<u8>,
    sink: fn(&str),
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            (self.sink)(String::from_utf8_lossy(&self.buf).trim_end());
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ConsoleMakeWriter {
    sink: fn(&str),
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

/// Subscriber writing `info` and above to `sink`, one line per event.
pub(crate) fn subscriber(sink: fn(&str)) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter { sink })
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .finish()
}

/// Install the console subscriber once. Later calls are no-ops.
#[cfg(target_arch = "wasm32")]
pub(crate) fn install() {
    let _ = tracing::subscriber::set_global_default(subscriber(log));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineSimulation;
    use std::cell::RefCell;

    thread_local! {
        static LINES: RefCell<Vec<String>> = RefCell::new(Vec::new());
    }

    fn capture(line: &str) {
        LINES.with(|lines| lines.borrow_mut().push(line.to_string()));
    }

    fn captured() -> Vec<String> {
        LINES.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn rejected_input_reaches_the_console() {
        captured();
        tracing::subscriber::with_default(subscriber(capture), || {
            let mut sim = PipelineSimulation::new();
            assert!(!sim.set_database_mode("oracle"));
            sim.set_broker_count(0);
            assert!(sim.set_backlog_policy("accumulate"));
        });

        let lines = captured();
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert!(lines[0].contains("WARN") && lines[0].contains("rejected database mode"));
        assert!(lines[1].contains("clamping"));
        assert!(lines[2].contains("INFO") && lines[2].contains("backlog policy changed"));
        assert!(lines.iter().all(|l| !l.ends_with('\n')));
    }

    #[test]
    fn per_tick_debug_events_are_filtered_out() {
        captured();
        tracing::subscriber::with_default(subscriber(capture), || {
            let mut sim = PipelineSimulation::new();
            sim.run_batch(3);
        });
        assert!(captured().is_empty());
    }
}
