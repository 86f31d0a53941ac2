//! Statistics collection and export.
//!
//! The engine keeps [`EngineStats`] counters while it runs and exports them as
//! JSON. A [`StatsCollector`] turns that export into a [`SimulationStats`]
//! report with wall-clock timing, which can be written as JSON, CSV or a
//! plain-text summary.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::types::SimTime;

/// Counters maintained by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Final simulation time
    pub final_time: SimTime,
    /// Steps executed
    pub steps_executed: u64,
    /// Leaf behaviors invoked
    pub behaviors_fired: u64,
    /// Leaf parts that were not eligible, summed over steps
    pub parts_skipped: u64,
    /// Values staged along wires
    pub wire_deliveries: u64,
    /// External events injected by synchronizers
    pub events_synchronized: u64,
    /// Records written to the waveform dump
    pub records_dumped: u64,
}

/// Figures for one synchronized event queue.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub name: String,
    pub capacity: usize,
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
}

/// Metadata about the simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationMetadata {
    /// Simulation name
    pub name: String,
    /// Start time, seconds since the Unix epoch
    pub start_time: Option<String>,
    /// End time, seconds since the Unix epoch
    pub end_time: Option<String>,
    /// Crate version
    pub version: String,
    /// Configuration file used, if any
    pub config_file: Option<String>,
    /// Top part of the design
    pub top: String,
    /// Execution strategy of the top part
    pub execution: String,
    /// Wire propagation mode
    pub propagation: String,
}

/// Timing/performance statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Total wall-clock time in milliseconds
    pub total_wall_time_ms: f64,
    /// Simulation time per wall-clock second
    pub sim_time_per_second: f64,
    /// Steps per wall-clock second
    pub steps_per_second: f64,
    /// Behaviors fired per wall-clock second
    pub behaviors_per_second: f64,
}

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub metadata: SimulationMetadata,
    pub engine: EngineStats,
    pub queues: Vec<QueueStats>,
    pub timing: TimingStats,
}

impl SimulationStats {
    pub fn new() -> Self {
        Self {
            metadata: SimulationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..SimulationMetadata::default()
            },
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    pub fn record_start(&mut self) {
        self.metadata.start_time = Some(epoch_now());
    }

    pub fn record_end(&mut self) {
        self.metadata.end_time = Some(epoch_now());
    }

    /// Derives rates from the engine counters and the elapsed wall time.
    pub fn compute_timing(&mut self, wall_time_ms: f64) {
        self.timing.total_wall_time_ms = wall_time_ms;

        if wall_time_ms > 0.0 {
            let seconds = wall_time_ms / 1000.0;
            self.timing.sim_time_per_second = self.engine.final_time as f64 / seconds;
            self.timing.steps_per_second = self.engine.steps_executed as f64 / seconds;
            self.timing.behaviors_per_second = self.engine.behaviors_fired as f64 / seconds;
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports the summary metrics as `metric,value` rows.
    pub fn to_csv(&self) -> String {
        let e = &self.engine;
        let rows = [
            ("final_time", e.final_time.to_string()),
            ("steps_executed", e.steps_executed.to_string()),
            ("behaviors_fired", e.behaviors_fired.to_string()),
            ("parts_skipped", e.parts_skipped.to_string()),
            ("wire_deliveries", e.wire_deliveries.to_string()),
            ("events_synchronized", e.events_synchronized.to_string()),
            ("records_dumped", e.records_dumped.to_string()),
            ("wall_time_ms", format!("{:.2}", self.timing.total_wall_time_ms)),
            ("sim_time_per_second", format!("{:.2}", self.timing.sim_time_per_second)),
            ("steps_per_second", format!("{:.2}", self.timing.steps_per_second)),
        ];

        let mut csv = String::from("metric,value\n");
        for (metric, value) in rows {
            csv.push_str(&format!("{},{}\n", metric, value));
        }
        csv
    }

    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    pub fn queues_to_csv(&self) -> String {
        let mut csv = String::from("queue,capacity,pushed,popped,dropped\n");
        for q in &self.queues {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                q.name, q.capacity, q.pushed, q.popped, q.dropped
            ));
        }
        csv
    }

    /// Writes a human-readable summary.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Simulation Statistics ===")?;
        writeln!(w)?;

        if !self.metadata.name.is_empty() {
            writeln!(w, "Name: {}", self.metadata.name)?;
        }
        if !self.metadata.top.is_empty() {
            writeln!(
                w,
                "Design: {} ({}, {})",
                self.metadata.top, self.metadata.execution, self.metadata.propagation
            )?;
        }
        if let Some(ref start) = self.metadata.start_time {
            writeln!(w, "Started: {}", start)?;
        }
        if let Some(ref end) = self.metadata.end_time {
            writeln!(w, "Ended: {}", end)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Engine ---")?;
        writeln!(w, "Final simulation time: {}", self.engine.final_time)?;
        writeln!(w, "Steps executed: {}", self.engine.steps_executed)?;
        writeln!(w, "Behaviors fired: {}", self.engine.behaviors_fired)?;
        writeln!(w, "Parts skipped: {}", self.engine.parts_skipped)?;
        writeln!(w, "Wire deliveries: {}", self.engine.wire_deliveries)?;
        writeln!(w, "Events synchronized: {}", self.engine.events_synchronized)?;
        writeln!(w, "Records dumped: {}", self.engine.records_dumped)?;
        writeln!(w)?;

        writeln!(w, "--- Timing ---")?;
        writeln!(w, "Wall time: {:.2} ms", self.timing.total_wall_time_ms)?;
        writeln!(w, "Sim time/sec: {:.2}", self.timing.sim_time_per_second)?;
        writeln!(w, "Steps/sec: {:.2}", self.timing.steps_per_second)?;

        if !self.queues.is_empty() {
            writeln!(w)?;
            writeln!(w, "--- Event queues ---")?;
            for q in &self.queues {
                writeln!(
                    w,
                    "{} (capacity {}): pushed {}, popped {}, dropped {}",
                    q.name, q.capacity, q.pushed, q.popped, q.dropped
                )?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Wall-clock stopwatch.
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

fn epoch_now() -> String {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    format!("{}s", duration.as_secs())
}

/// Builds a [`SimulationStats`] report around a run.
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: SimulationStats,
    stopwatch: Option<Stopwatch>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            stats: SimulationStats::new(),
            stopwatch: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.stats.metadata.name = name.into();
    }

    pub fn set_config_file(&mut self, path: impl Into<String>) {
        self.stats.metadata.config_file = Some(path.into());
    }

    pub fn start(&mut self) {
        self.stopwatch = Some(Stopwatch::start());
        self.stats.record_start();
    }

    pub fn stop(&mut self) {
        self.stats.record_end();
        if let Some(ref stopwatch) = self.stopwatch {
            self.stats.compute_timing(stopwatch.elapsed_ms());
        }
    }

    /// Updates the report from `Simulation::export_stats` output.
    pub fn update_from_json(&mut self, json: &serde_json::Value) {
        if let Some(engine) = json.get("engine") {
            let count = |key: &str| engine[key].as_u64().unwrap_or(0);
            self.stats.engine = EngineStats {
                final_time: count("current_time"),
                steps_executed: count("steps_executed"),
                behaviors_fired: count("behaviors_fired"),
                parts_skipped: count("parts_skipped"),
                wire_deliveries: count("wire_deliveries"),
                events_synchronized: count("events_synchronized"),
                records_dumped: count("records_dumped"),
            };
        }

        if let Some(design) = json.get("design") {
            let text = |key: &str| design[key].as_str().unwrap_or_default().to_string();
            self.stats.metadata.top = text("top");
            self.stats.metadata.execution = text("execution");
            self.stats.metadata.propagation = text("propagation");
        }

        if let Some(queues) = json.get("queues").and_then(|q| q.as_array()) {
            self.stats.queues = queues
                .iter()
                .map(|q| QueueStats {
                    name: q["name"].as_str().unwrap_or_default().to_string(),
                    capacity: q["capacity"].as_u64().unwrap_or(0) as usize,
                    pushed: q["pushed"].as_u64().unwrap_or(0),
                    popped: q["popped"].as_u64().unwrap_or(0),
                    dropped: q["dropped"].as_u64().unwrap_or(0),
                })
                .collect();
        }
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn into_stats(self) -> SimulationStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = SimulationStats::new().with_name("register testbench");
        assert_eq!(stats.metadata.name, "register testbench");
        assert_eq!(stats.metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_stats_csv_export() {
        let mut stats = SimulationStats::new();
        stats.engine.final_time = 1000;
        stats.engine.behaviors_fired = 500;

        let csv = stats.to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("final_time,1000"));
        assert!(csv.contains("behaviors_fired,500"));
    }

    #[test]
    fn test_timing_rates() {
        let mut stats = SimulationStats::new();
        stats.engine.final_time = 2000;
        stats.engine.steps_executed = 200;
        stats.compute_timing(500.0);
        assert_eq!(stats.timing.sim_time_per_second, 4000.0);
        assert_eq!(stats.timing.steps_per_second, 400.0);
    }

    #[test]
    fn test_stopwatch() {
        let sw = Stopwatch::start();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(sw.elapsed_ms() >= 10.0);
    }

    #[test]
    fn test_collector_from_json() {
        let mut collector = StatsCollector::new();
        collector.set_name("tb");
        collector.start();

        let json = serde_json::json!({
            "engine": {
                "current_time": 40,
                "steps_executed": 40,
                "behaviors_fired": 90,
                "parts_skipped": 70,
                "wire_deliveries": 55,
                "events_synchronized": 20,
                "records_dumped": 33
            },
            "design": {
                "top": "tb",
                "execution": "sequential",
                "propagation": "single_hop"
            },
            "queues": [
                {"name": "timer_q", "capacity": 1, "pushed": 20, "popped": 20, "dropped": 10}
            ]
        });
        collector.update_from_json(&json);
        collector.stop();

        let stats = collector.stats();
        assert_eq!(stats.engine.behaviors_fired, 90);
        assert_eq!(stats.metadata.top, "tb");
        assert_eq!(stats.queues[0].dropped, 10);
        assert!(stats.queues_to_csv().contains("timer_q,1,20,20,10"));

        let summary = stats.summary();
        assert!(summary.contains("Name: tb"));
        assert!(summary.contains("Design: tb (sequential, single_hop)"));
    }
}
