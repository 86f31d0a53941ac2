//! Configuration system.
//!
//! Simulations can be described declaratively in YAML or JSON: engine
//! settings, an optional waveform monitor, and the design as a flat list of
//! part declarations. Leaf parts name a registered type (see
//! [`PartRegistry`]); composite parts list their children by name.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   max_steps: 40
//!   time_step: 1
//!   propagation: single_hop
//!   log_level: info
//!
//! monitor:
//!   file: logs/waveforms.vcd
//!   time_source: clock.time_port
//!   signals:
//!     - { name: clock.clk, path: clock.clk }
//!     - { name: dut.out_0, path: dut.out_0 }
//!
//! design:
//!   top: tb
//!   parts:
//!     - name: tb
//!       class: Testbench
//!       execution: sequential
//!       children: [clock, dut]
//!       wires:
//!         - { from: clock.clk, to: dut.clk }
//!     - name: clock
//!       type: FreeRunningClock
//!     - name: dut
//!       type: Register
//! ```
//!
//! `log_level` takes an `EnvFilter` directive such as `debug` or
//! `kairo=trace,warn`. It is applied by [`SimConfig::init_logging`], which a
//! configuration-driven binary calls once before building the simulation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::engine::{EngineConfig, RunLimits, Simulation};
use crate::error::SimError;
use crate::monitor::{TimeSource, WaveformMonitor};
use crate::part::{Part, WireSpec};
use crate::port::PortSpec;
use crate::registry::{Attrs, PartRegistry};
use crate::schedule::{Execution, Schedule};
use crate::types::SimTime;
use crate::wire::Propagation;

/// Errors that can occur while loading a configuration or building from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error("Unknown part type: {0}")]
    UnknownPartType(String),

    #[error("Design error: {0}")]
    Design(#[from] SimError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Step budget
    #[serde(default)]
    pub max_steps: Option<u64>,

    /// Simulated time budget
    #[serde(default)]
    pub max_time: Option<SimTime>,

    /// Simulated time per step
    #[serde(default = "default_time_step")]
    pub time_step: SimTime,

    /// Wall-clock budget in milliseconds
    #[serde(default)]
    pub wall_timeout_ms: Option<u64>,

    #[serde(default)]
    pub propagation: Propagation,

    /// Logging filter: a level (trace, debug, info, warn, error) or a
    /// directive list like `kairo=debug,warn`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_time_step() -> SimTime {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_time: None,
            time_step: default_time_step(),
            wall_timeout_ms: None,
            propagation: Propagation::default(),
            log_level: default_log_level(),
        }
    }
}

impl SimulationParams {
    /// Engine settings described by these parameters.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            time_step: self.time_step,
            propagation: self.propagation,
            limits: RunLimits {
                max_steps: self.max_steps,
                max_time: self.max_time,
                wall_clock: self.wall_timeout_ms.map(Duration::from_millis),
            },
        }
    }
}

/// One monitored signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Name shown in the dump
    pub name: String,
    /// Port path relative to the top part
    pub path: String,
}

/// Waveform monitor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Dump file
    pub file: String,

    #[serde(default = "default_timescale")]
    pub timescale: String,

    /// Multiplier for real-valued time sources
    #[serde(default = "default_real_scale")]
    pub real_scale: f64,

    /// Port path providing dump timestamps; simulated time when absent
    #[serde(default)]
    pub time_source: Option<String>,

    #[serde(default)]
    pub signals: Vec<SignalConfig>,
}

fn default_timescale() -> String {
    "1ms".to_string()
}

fn default_real_scale() -> f64 {
    1000.0
}

impl MonitorConfig {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            timescale: default_timescale(),
            real_scale: default_real_scale(),
            time_source: None,
            signals: Vec::new(),
        }
    }

    pub fn with_time_source(mut self, path: impl Into<String>) -> Self {
        self.time_source = Some(path.into());
        self
    }

    pub fn with_signal(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.signals.push(SignalConfig {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    pub fn time(&self) -> TimeSource {
        match &self.time_source {
            Some(path) => TimeSource::Port(path.clone()),
            None => TimeSource::SimTime,
        }
    }
}

/// Declaration of one part.
///
/// A part with a `type` is a leaf built by the registry; a part without one
/// is a composite assembled from `children`, `ports` and `wires`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    pub name: String,

    /// Registered leaf type
    #[serde(default, rename = "type")]
    pub part_type: Option<String>,

    /// Overrides the class name
    #[serde(default)]
    pub class: Option<String>,

    /// Overrides the scheduling predicate
    #[serde(default)]
    pub schedule: Option<Schedule>,

    /// Leaf factory attributes
    #[serde(default)]
    pub attrs: Attrs,

    #[serde(default)]
    pub execution: Option<Execution>,

    /// Child part names
    #[serde(default)]
    pub children: Vec<String>,

    /// Composite ports
    #[serde(default)]
    pub ports: Vec<PortSpec>,

    #[serde(default)]
    pub wires: Vec<WireSpec>,
}

impl PartConfig {
    pub fn leaf(name: impl Into<String>, part_type: impl Into<String>) -> Self {
        Self {
            part_type: Some(part_type.into()),
            execution: None,
            ..Self::composite(name, Execution::Sequential)
        }
    }

    pub fn composite(name: impl Into<String>, execution: Execution) -> Self {
        Self {
            name: name.into(),
            part_type: None,
            class: None,
            schedule: None,
            attrs: Attrs::new(),
            execution: Some(execution),
            children: Vec::new(),
            ports: Vec::new(),
            wires: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_child(mut self, name: impl Into<String>) -> Self {
        self.children.push(name.into());
        self
    }

    pub fn with_port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_wire(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.wires.push(WireSpec::new(from, to));
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.part_type.is_some()
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.is_leaf() {
            if !self.children.is_empty() || !self.wires.is_empty() || !self.ports.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Leaf part '{}' cannot declare children, ports or wires",
                    self.name
                )));
            }
        } else if !self.attrs.is_empty() {
            tracing::warn!("Composite part '{}' has attrs set (ignored)", self.name);
        }
        Ok(())
    }
}

/// The design section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Name of the top part
    #[serde(default)]
    pub top: String,

    #[serde(default)]
    pub parts: Vec<PartConfig>,
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationParams,

    #[serde(default)]
    pub monitor: Option<MonitorConfig>,

    #[serde(default)]
    pub design: DesignConfig,
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Installs the global tracing subscriber at `simulation.log_level`.
    ///
    /// `RUST_LOG` still takes precedence. Call at most once per process.
    pub fn init_logging(&self) {
        crate::init_logging(&self.simulation.log_level);
    }

    /// Validates settings and the shape of the design section.
    ///
    /// Containment is checked when the design is built, since it needs the
    /// whole part graph.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.simulation.time_step == 0 {
            return Err(ConfigError::Validation("time_step must be positive".to_string()));
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.simulation.log_level) {
            return Err(ConfigError::Validation(format!(
                "Invalid log_level '{}': {}",
                self.simulation.log_level, e
            )));
        }

        if let Some(monitor) = &self.monitor {
            let mut names = HashSet::new();
            for signal in &monitor.signals {
                if !names.insert(signal.name.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Duplicate monitor signal: {}",
                        signal.name
                    )));
                }
            }
            if !(monitor.real_scale.is_finite() && monitor.real_scale > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "Invalid monitor real_scale: {}",
                    monitor.real_scale
                )));
            }
        }

        let mut part_names = HashSet::new();
        for part in &self.design.parts {
            part.validate()?;
            if !part_names.insert(part.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate part name: {}",
                    part.name
                )));
            }
        }

        if !self.design.parts.is_empty() && !part_names.contains(self.design.top.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Top part '{}' is not declared",
                self.design.top
            )));
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn part_count(&self) -> usize {
        self.design.parts.len()
    }

    pub fn find_part(&self, name: &str) -> Option<&PartConfig> {
        self.design.parts.iter().find(|p| p.name == name)
    }

    /// Checks containment: no cycles, no unknown children, no part with two
    /// parents.
    fn check_containment(&self) -> ConfigResult<()> {
        let by_name: HashMap<&str, &PartConfig> = self
            .design
            .parts
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        let mut roots: Vec<&str> = by_name.keys().copied().collect();
        roots.sort_unstable();
        roots.insert(0, self.design.top.as_str());

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        for root in roots {
            visit(root, &by_name, &mut marks, &mut stack)?;
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        for part in &self.design.parts {
            for child in &part.children {
                if let Some(first) = parent.insert(child.as_str(), part.name.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Part '{}' is a child of both '{}' and '{}'",
                        child, first, part.name
                    )));
                }
            }
        }

        for name in by_name.keys() {
            if *name != self.design.top && !parent.contains_key(name) {
                tracing::warn!("Part '{}' is not reachable from top '{}' (ignored)", name, self.design.top);
            }
        }
        Ok(())
    }

    fn build_part(&self, name: &str, registry: &PartRegistry) -> ConfigResult<Part> {
        let decl = self
            .find_part(name)
            .ok_or_else(|| ConfigError::Validation(format!("Unknown part: {}", name)))?;

        let mut part = match &decl.part_type {
            Some(part_type) => registry.create(part_type, &decl.name, &decl.attrs)?,
            None => {
                let mut part = Part::composite(&decl.name, decl.execution.unwrap_or_default())
                    .with_ports(decl.ports.iter().cloned());
                for child in &decl.children {
                    part = part.with_child(self.build_part(child, registry)?);
                }
                for wire in &decl.wires {
                    part = part.wire(wire.from.as_str(), wire.to.as_str());
                }
                part
            }
        };
        if let Some(class) = &decl.class {
            part = part.with_class(class.as_str());
        }
        if let Some(schedule) = &decl.schedule {
            part = part.with_schedule(schedule.clone());
        }
        Ok(part)
    }

    /// Builds the top part declaration.
    pub fn build_design(&self, registry: &PartRegistry) -> ConfigResult<Part> {
        self.validate()?;
        if self.design.parts.is_empty() {
            return Err(ConfigError::Validation("Design declares no parts".to_string()));
        }
        self.check_containment()?;
        let top = self.build_part(&self.design.top, registry)?;
        tracing::info!(top = %self.design.top, parts = self.part_count(), "design built from configuration");
        Ok(top)
    }

    /// Builds, elaborates and wraps the design in a simulation, with the
    /// monitor attached when one is configured.
    pub fn build_simulation(&self, registry: &PartRegistry) -> ConfigResult<Simulation> {
        let top = self.build_design(registry)?;
        let mut sim = Simulation::from_part(top, self.simulation.engine_config())?;

        if let Some(cfg) = &self.monitor {
            let monitor = WaveformMonitor::to_file(&cfg.file)?
                .with_timescale(cfg.timescale.as_str())
                .with_real_scale(cfg.real_scale);
            let signals = cfg.signals.iter().map(|s| (s.name.as_str(), s.path.as_str()));
            sim.attach_monitor(monitor, signals, cfg.time())?;
        }
        Ok(sim)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first walk over child references, reporting the first cycle found.
fn visit<'a>(
    name: &'a str,
    by_name: &HashMap<&'a str, &'a PartConfig>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> ConfigResult<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let pos = stack.iter().position(|n| *n == name).unwrap_or(0);
            let mut path = stack[pos..].to_vec();
            path.push(name);
            return Err(SimError::Cycle {
                path: path.join(" -> "),
            }
            .into());
        }
        None => {}
    }
    let Some(part) = by_name.get(name).copied() else {
        return Ok(());
    };

    marks.insert(name, Mark::Visiting);
    stack.push(name);
    for child in &part.children {
        if !by_name.contains_key(child.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Part '{}' references unknown child '{}'",
                part.name, child
            )));
        }
        visit(child.as_str(), by_name, marks, stack)?;
    }
    stack.pop();
    marks.insert(name, Mark::Done);
    Ok(())
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_steps(mut self, steps: u64) -> Self {
        self.config.simulation.max_steps = Some(steps);
        self
    }

    pub fn max_time(mut self, time: SimTime) -> Self {
        self.config.simulation.max_time = Some(time);
        self
    }

    pub fn time_step(mut self, step: SimTime) -> Self {
        self.config.simulation.time_step = step;
        self
    }

    pub fn wall_timeout_ms(mut self, ms: u64) -> Self {
        self.config.simulation.wall_timeout_ms = Some(ms);
        self
    }

    pub fn propagation(mut self, propagation: Propagation) -> Self {
        self.config.simulation.propagation = propagation;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    pub fn monitor(mut self, monitor: MonitorConfig) -> Self {
        self.config.monitor = Some(monitor);
        self
    }

    pub fn top(mut self, name: impl Into<String>) -> Self {
        self.config.design.top = name.into();
        self
    }

    pub fn add_part(mut self, part: PartConfig) -> Self {
        self.config.design.parts.push(part);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::create_default_registry;

    fn testbench() -> SimConfigBuilder {
        SimConfigBuilder::new()
            .max_steps(20)
            .top("tb")
            .add_part(
                PartConfig::composite("tb", Execution::Sequential)
                    .with_class("Testbench")
                    .with_child("clock")
                    .with_child("dut")
                    .with_wire("clock.clk", "dut.clk"),
            )
            .add_part(PartConfig::leaf("clock", "FreeRunningClock"))
            .add_part(PartConfig::leaf("dut", "Register"))
    }

    #[test]
    fn test_default_config() {
        let config = SimConfig::new();
        assert_eq!(config.simulation.time_step, 1);
        assert_eq!(config.simulation.propagation, Propagation::SingleHop);
        assert!(config.monitor.is_none());
        assert!(config.design.parts.is_empty());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
simulation:
  max_steps: 50
  time_step: 10
  propagation: transitive
  log_level: debug

monitor:
  file: out/wave.vcd
  time_source: clock.time_port
  signals:
    - { name: clk, path: clock.clk }

design:
  top: tb
  parts:
    - name: tb
      execution: concurrent
      children: [clock, src]
      ports:
        - { name: rst, direction: out }
      wires:
        - { from: clock.clk, to: src.clk }
    - name: clock
      type: Clock
    - name: src
      type: Source
      schedule:
        any_updated: [clk]
      attrs:
        reset_cycles: "3"
"#;

        let config = SimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.max_steps, Some(50));
        assert_eq!(config.simulation.propagation, Propagation::Transitive);
        let monitor = config.monitor.as_ref().unwrap();
        assert_eq!(monitor.timescale, "1ms");
        assert_eq!(monitor.time(), TimeSource::Port("clock.time_port".to_string()));

        let tb = config.find_part("tb").unwrap();
        assert_eq!(tb.execution, Some(Execution::Concurrent));
        assert_eq!(tb.ports[0].name, "rst");
        let src = config.find_part("src").unwrap();
        assert_eq!(src.schedule, Some(Schedule::any_updated(["clk"])));
        assert_eq!(src.attrs["reset_cycles"], "3");
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "simulation": { "max_time": 100, "time_step": 5 },
            "design": {
                "top": "g",
                "parts": [ { "name": "g", "type": "And" } ]
            }
        }"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.simulation.max_time, Some(100));
        assert_eq!(config.part_count(), 1);
        assert!(config.find_part("g").unwrap().is_leaf());
    }

    #[test]
    fn test_build_simulation() {
        let config = testbench().build().unwrap();
        let mut sim = config.build_simulation(&create_default_registry()).unwrap();
        assert_eq!(sim.design().parts().len(), 3);
        assert_eq!(sim.design().top().class(), "Testbench");

        let summary = sim.run().unwrap();
        assert_eq!(summary.steps, 20);
    }

    #[test]
    fn test_validation_errors() {
        assert!(SimConfigBuilder::new().time_step(0).build().is_err());

        let dup = SimConfigBuilder::new()
            .top("a")
            .add_part(PartConfig::leaf("a", "Sink"))
            .add_part(PartConfig::leaf("a", "Sink"))
            .build();
        assert!(matches!(dup, Err(ConfigError::Validation(_))));

        let missing_top = SimConfigBuilder::new()
            .top("tb")
            .add_part(PartConfig::leaf("a", "Sink"))
            .build();
        assert!(missing_top.is_err());

        let leaf_with_children = SimConfigBuilder::new()
            .top("a")
            .add_part(PartConfig::leaf("a", "Sink").with_child("b"))
            .build();
        assert!(leaf_with_children.is_err());
    }

    #[test]
    fn test_log_level_directives() {
        for level in ["debug", "warn", "kairo=trace,warn", "kairo::engine=debug"] {
            let config = SimConfigBuilder::new().log_level(level).build().unwrap();
            assert_eq!(config.simulation.log_level, level);
        }

        let err = SimConfigBuilder::new().log_level("kairo=loud").build().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("log_level")));

        let yaml = "simulation:\n  log_level: kairo=loud\n";
        assert!(matches!(SimConfig::from_yaml(yaml), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_containment_cycle() {
        let config = SimConfigBuilder::new()
            .top("top")
            .add_part(PartConfig::composite("top", Execution::Sequential).with_child("a"))
            .add_part(PartConfig::composite("a", Execution::Sequential).with_child("b"))
            .add_part(PartConfig::composite("b", Execution::Sequential).with_child("a"))
            .build()
            .unwrap();
        match config.build_design(&create_default_registry()).unwrap_err() {
            ConfigError::Design(SimError::Cycle { path }) => assert_eq!(path, "a -> b -> a"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_containment() {
        let config = SimConfigBuilder::new()
            .top("top")
            .add_part(PartConfig::composite("top", Execution::Sequential).with_child("x"))
            .add_part(PartConfig::composite("x", Execution::Sequential).with_child("x"))
            .build()
            .unwrap();
        match config.build_design(&create_default_registry()).unwrap_err() {
            ConfigError::Design(SimError::Cycle { path }) => assert_eq!(path, "x -> x"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_two_parents() {
        let config = SimConfigBuilder::new()
            .top("top")
            .add_part(
                PartConfig::composite("top", Execution::Sequential)
                    .with_child("left")
                    .with_child("right"),
            )
            .add_part(PartConfig::composite("left", Execution::Sequential).with_child("s"))
            .add_part(PartConfig::composite("right", Execution::Sequential).with_child("s"))
            .add_part(PartConfig::leaf("s", "Sink"))
            .build()
            .unwrap();
        assert!(matches!(
            config.build_design(&create_default_registry()),
            Err(ConfigError::Validation(msg)) if msg.contains("child of both")
        ));
    }

    #[test]
    fn test_unknown_child_and_type() {
        let config = SimConfigBuilder::new()
            .top("top")
            .add_part(PartConfig::composite("top", Execution::Sequential).with_child("ghost"))
            .build()
            .unwrap();
        assert!(matches!(
            config.build_design(&create_default_registry()),
            Err(ConfigError::Validation(_))
        ));

        let config = SimConfigBuilder::new()
            .top("alu")
            .add_part(PartConfig::leaf("alu", "Alu"))
            .build()
            .unwrap();
        assert!(matches!(
            config.build_design(&create_default_registry()),
            Err(ConfigError::UnknownPartType(_))
        ));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = testbench()
            .monitor(MonitorConfig::new("w.vcd").with_signal("clk", "clock.clk"))
            .build()
            .unwrap();

        let yaml = config.to_yaml().unwrap();
        let restored = SimConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config, restored);

        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }
}
