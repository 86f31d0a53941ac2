//! The simulation engine.
//!
//! A [`Simulation`] owns an elaborated [`Design`] and advances it one step at
//! a time. Each step runs five phases in order:
//!
//! 1. clear every port's updated flag and land the values delivered over wires
//!    during the previous step;
//! 2. inject at most one pending event per synchronizer into its target port;
//! 3. execute the eligible parts under each composite's strategy;
//! 4. propagate updated wire sources to their destinations;
//! 5. let the waveform monitor dump the updated monitored ports.
//!
//! Step `n` runs at simulated time `n * time_step`. A stop request, from a
//! part or from another thread, is observed between steps only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::design::Design;
use crate::error::{SimError, SimResult};
use crate::event::{EventQueue, QueueDirection, Synchronizer};
use crate::executor::{self, StepFrame, StepTally};
use crate::monitor::{TimeSource, WaveformMonitor};
use crate::part::Part;
use crate::source::StopHandle;
use crate::stats::EngineStats;
use crate::types::{SimTime, Step};
use crate::wire::Propagation;

/// Bounds on a run. A run with no bounds ends only on a stop request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunLimits {
    pub max_steps: Option<u64>,
    pub max_time: Option<SimTime>,
    pub wall_clock: Option<Duration>,
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Simulated time per step
    pub time_step: SimTime,
    pub propagation: Propagation,
    pub limits: RunLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_step: 1,
            propagation: Propagation::SingleHop,
            limits: RunLimits::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_step(mut self, time_step: SimTime) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.limits.max_steps = Some(steps);
        self
    }

    pub fn with_max_time(mut self, time: SimTime) -> Self {
        self.limits.max_time = Some(time);
        self
    }

    pub fn with_wall_clock(mut self, limit: Duration) -> Self {
        self.limits.wall_clock = Some(limit);
        self
    }
}

/// Lifecycle of a [`Simulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Completed => "completed",
            EngineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxSteps,
    MaxTime,
    WallClock,
    StopRequested,
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub final_time: SimTime,
    pub wall_time_ms: f64,
    pub reason: StopReason,
}

/// A simulation run over one design.
pub struct Simulation {
    design: Design,
    config: EngineConfig,
    state: EngineState,
    step: Step,
    synchronizers: Vec<Synchronizer>,
    monitor: Option<WaveformMonitor>,
    stop: StopHandle,
    stats: EngineStats,
    started: Option<Instant>,
}

impl Simulation {
    pub fn new(design: Design, config: EngineConfig) -> Self {
        Self {
            design,
            config,
            state: EngineState::Idle,
            step: 0,
            synchronizers: Vec::new(),
            monitor: None,
            stop: StopHandle::new(),
            stats: EngineStats::default(),
            started: None,
        }
    }

    /// Elaborates `top` and wraps it in a simulation.
    pub fn from_part(top: Part, config: EngineConfig) -> SimResult<Self> {
        Ok(Self::new(Design::new(top)?, config))
    }

    fn expect_idle(&self, action: &str) -> SimResult<()> {
        if self.state != EngineState::Idle {
            return Err(SimError::InvalidState {
                state: self.state.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// Attaches a waveform monitor with its signal mapping (display name to
    /// port path) and time source. Only allowed before the first step.
    pub fn attach_monitor<I, N, P>(
        &mut self,
        mut monitor: WaveformMonitor,
        signals: I,
        time: TimeSource,
    ) -> SimResult<()>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        self.expect_idle("attach a monitor")?;
        monitor.bind(&self.design, signals, time)?;
        self.monitor = Some(monitor);
        Ok(())
    }

    /// Feeds events from an inbound `queue` into the port at `path`.
    pub fn synchronize(&mut self, queue: &EventQueue, path: &str) -> SimResult<()> {
        self.expect_idle("add a synchronizer")?;
        if queue.direction() != QueueDirection::In {
            return Err(SimError::InvalidWire {
                from: queue.name().to_string(),
                to: path.to_string(),
                reason: "only inbound queues can feed a port".to_string(),
            });
        }
        let target = self.design.resolve_port(path)?;
        tracing::debug!(queue = queue.name(), port = path, "synchronizer added");
        self.synchronizers.push(Synchronizer {
            queue: queue.clone(),
            target,
            path: self.design.port_path(target),
        });
        Ok(())
    }

    /// A handle that ends the run at the next step boundary.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of steps executed.
    pub fn current_step(&self) -> Step {
        self.step
    }

    /// Simulated time at which the next step runs. Saturates at `SimTime::MAX`.
    pub fn current_time(&self) -> SimTime {
        self.step.saturating_mul(self.config.time_step)
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn monitor(&self) -> Option<&WaveformMonitor> {
        self.monitor.as_ref()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn start(&mut self) {
        self.design.reset();
        self.state = EngineState::Running;
        self.started = Some(Instant::now());
        tracing::info!(
            top = self.design.top().path(),
            parts = self.design.parts().len(),
            wires = self.design.wires().len(),
            propagation = ?self.config.propagation,
            "simulation started"
        );
    }

    /// Executes one step.
    pub fn step(&mut self) -> SimResult<StepTally> {
        match self.state {
            EngineState::Idle => self.start(),
            EngineState::Running => {}
            EngineState::Completed | EngineState::Failed => {
                return Err(SimError::InvalidState {
                    state: self.state.to_string(),
                    action: "step".to_string(),
                });
            }
        }

        match self.run_step() {
            Ok(tally) => Ok(tally),
            Err(error) => {
                self.state = EngineState::Failed;
                tracing::error!(step = self.step, %error, "simulation failed");
                if let Some(monitor) = self.monitor.as_mut() {
                    if let Err(e) = monitor.finalize() {
                        tracing::warn!(error = %e, "could not finalize waveform dump");
                    }
                }
                Err(error)
            }
        }
    }

    fn run_step(&mut self) -> SimResult<StepTally> {
        let step = self.step;
        let time = step
            .checked_mul(self.config.time_step)
            .ok_or(SimError::TimeOverflow {
                step,
                time_step: self.config.time_step,
            })?;

        self.design.begin_step();

        for sync in &self.synchronizers {
            if let Some(event) = sync.next() {
                tracing::trace!(step, port = %sync.path, event_time = event.time, "event injected");
                self.design.inject(sync.target, event.payload, step)?;
                self.stats.events_synchronized += 1;
            }
        }

        let frame = StepFrame::new(step, time, self.stop.flag());
        let tally = executor::execute(self.design.nodes_mut(), &frame)?;

        let deliveries = self.design.propagate(self.config.propagation);

        if let Some(monitor) = self.monitor.as_mut() {
            let dumped = monitor.observe(&self.design, time)?;
            self.stats.records_dumped += dumped as u64;
        }

        self.step += 1;
        self.stats.steps_executed += 1;
        self.stats.behaviors_fired += tally.fired;
        self.stats.parts_skipped += tally.skipped;
        self.stats.wire_deliveries += deliveries as u64;
        self.stats.final_time = self.current_time();

        tracing::debug!(
            step,
            time,
            fired = tally.fired,
            skipped = tally.skipped,
            deliveries,
            "step done"
        );
        Ok(tally)
    }

    fn limit_reached(&self) -> Option<StopReason> {
        let limits = &self.config.limits;
        if self.stop.is_stop_requested() {
            return Some(StopReason::StopRequested);
        }
        if limits.max_steps.is_some_and(|max| self.step >= max) {
            return Some(StopReason::MaxSteps);
        }
        if limits.max_time.is_some_and(|max| self.current_time() >= max) {
            return Some(StopReason::MaxTime);
        }
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        if limits.wall_clock.is_some_and(|max| elapsed >= max) {
            return Some(StopReason::WallClock);
        }
        None
    }

    /// Runs until a limit is reached or a stop is requested, then finishes.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        if self.state == EngineState::Idle {
            self.start();
        }
        let reason = loop {
            if let Some(reason) = self.limit_reached() {
                break reason;
            }
            self.step()?;
        };
        self.finish(reason)
    }

    /// Ends the run: finalizes the dump and closes the synchronized queues.
    pub fn finish(&mut self, reason: StopReason) -> SimResult<RunSummary> {
        match self.state {
            EngineState::Running => {}
            EngineState::Idle => self.start(),
            EngineState::Completed | EngineState::Failed => {
                return Err(SimError::InvalidState {
                    state: self.state.to_string(),
                    action: "finish".to_string(),
                });
            }
        }

        for sync in &self.synchronizers {
            sync.queue.close();
        }
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.finalize()?;
        }
        self.state = EngineState::Completed;

        let summary = RunSummary {
            steps: self.step,
            final_time: self.current_time(),
            wall_time_ms: self
                .started
                .map(|s| s.elapsed().as_secs_f64() * 1000.0)
                .unwrap_or_default(),
            reason,
        };
        tracing::info!(
            steps = summary.steps,
            final_time = summary.final_time,
            reason = ?summary.reason,
            "simulation completed"
        );
        Ok(summary)
    }

    /// Exports engine counters, design shape and queue figures as JSON.
    pub fn export_stats(&self) -> serde_json::Value {
        let queues: Vec<_> = self
            .synchronizers
            .iter()
            .map(|s| s.queue.export_stats())
            .collect();
        let execution = self
            .design
            .top()
            .execution()
            .map(|e| format!("{:?}", e).to_lowercase())
            .unwrap_or_else(|| "leaf".to_string());
        let propagation = match self.config.propagation {
            Propagation::SingleHop => "single_hop",
            Propagation::Transitive => "transitive",
        };

        serde_json::json!({
            "engine": {
                "state": self.state.to_string(),
                "current_time": self.current_time(),
                "time_step": self.config.time_step,
                "steps_executed": self.stats.steps_executed,
                "behaviors_fired": self.stats.behaviors_fired,
                "parts_skipped": self.stats.parts_skipped,
                "wire_deliveries": self.stats.wire_deliveries,
                "events_synchronized": self.stats.events_synchronized,
                "records_dumped": self.stats.records_dumped,
                "parallel": cfg!(feature = "parallel"),
            },
            "design": {
                "top": self.design.top().path(),
                "parts": self.design.parts().len(),
                "leaves": self.design.leaf_count(),
                "wires": self.design.wires().len(),
                "execution": execution,
                "propagation": propagation,
            },
            "queues": queues,
        })
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("design", &self.design)
            .field("state", &self.state)
            .field("step", &self.step)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::FnBehavior;
    use crate::event::Event;
    use crate::port::PortSpec;
    use crate::schedule::{Execution, Schedule};
    use crate::value::{Value, ValueType};

    fn counter() -> Part {
        let mut n = 0_i64;
        Part::leaf(
            "count",
            FnBehavior::new(move |ctx| {
                n += 1;
                ctx.write("n", n)
            }),
        )
        .with_port(PortSpec::output("n").typed(ValueType::Int))
    }

    #[test]
    fn test_time_advances_per_step() {
        let mut sim = Simulation::from_part(counter(), EngineConfig::new().with_time_step(10)).unwrap();
        assert_eq!(sim.state(), EngineState::Idle);
        sim.step().unwrap();
        sim.step().unwrap();
        assert_eq!(sim.state(), EngineState::Running);
        assert_eq!(sim.current_step(), 2);
        assert_eq!(sim.current_time(), 20);
        assert_eq!(sim.design().peek("n").unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn test_max_steps() {
        let config = EngineConfig::new().with_max_steps(7);
        let mut sim = Simulation::from_part(counter(), config).unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.steps, 7);
        assert_eq!(summary.reason, StopReason::MaxSteps);
        assert_eq!(sim.state(), EngineState::Completed);
        assert!(matches!(sim.step(), Err(SimError::InvalidState { .. })));
    }

    #[test]
    fn test_max_time() {
        let config = EngineConfig::new().with_time_step(5).with_max_time(23);
        let mut sim = Simulation::from_part(counter(), config).unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.reason, StopReason::MaxTime);
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.final_time, 25);
    }

    #[test]
    fn test_time_overflow_fails_run() {
        let config = EngineConfig::new().with_time_step(SimTime::MAX).with_max_steps(3);
        let mut sim = Simulation::from_part(counter(), config).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(
            err,
            SimError::TimeOverflow {
                step: 2,
                time_step: SimTime::MAX
            }
        ));
        assert_eq!(sim.state(), EngineState::Failed);
        assert_eq!(sim.current_step(), 2);
        assert_eq!(sim.current_time(), SimTime::MAX);
    }

    #[test]
    fn test_stop_from_behavior() {
        let part = Part::leaf(
            "stopper",
            FnBehavior::new(|ctx| {
                if ctx.step() == 3 {
                    ctx.request_stop();
                }
                Ok(())
            }),
        );
        let mut sim = Simulation::from_part(part, EngineConfig::new().with_max_steps(100)).unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.reason, StopReason::StopRequested);
        // the requesting step completes
        assert_eq!(summary.steps, 4);
    }

    #[test]
    fn test_failure_sets_state() {
        let part = Part::leaf(
            "bad",
            FnBehavior::new(|ctx| {
                if ctx.step() == 2 {
                    return Err(SimError::behavior("broken"));
                }
                Ok(())
            }),
        );
        let mut sim = Simulation::from_part(part, EngineConfig::new().with_max_steps(10)).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(err, SimError::PartFailed { step: 2, ref part, .. } if part == "bad"));
        assert_eq!(sim.state(), EngineState::Failed);
    }

    #[test]
    fn test_synchronizer_one_event_per_step() {
        let sink = Part::leaf("sink", FnBehavior::new(|_| Ok(())))
            .with_port(PortSpec::input("time").typed(ValueType::Int))
            .with_schedule(Schedule::all_updated(["time"]));
        let top = Part::composite("tb", Execution::Sequential).with_child(sink);
        let mut sim = Simulation::from_part(top, EngineConfig::new()).unwrap();

        let queue = EventQueue::new("q", 4);
        for t in [10, 20] {
            queue.push(Event::new(t, t as i64)).unwrap();
        }
        sim.synchronize(&queue, "sink.time").unwrap();

        let first = sim.step().unwrap();
        assert_eq!(first.fired, 1);
        assert_eq!(sim.design().peek("sink.time").unwrap(), Some(Value::Int(10)));
        sim.step().unwrap();
        assert_eq!(sim.design().peek("sink.time").unwrap(), Some(Value::Int(20)));
        let idle = sim.step().unwrap();
        assert_eq!(idle, StepTally { fired: 0, skipped: 1 });
        assert_eq!(sim.stats().events_synchronized, 2);

        sim.finish(StopReason::StopRequested).unwrap();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_outbound_queue_rejected() {
        let mut sim = Simulation::from_part(counter(), EngineConfig::new()).unwrap();
        let queue = EventQueue::with_direction("out", 1, QueueDirection::Out);
        assert!(matches!(
            sim.synchronize(&queue, "n"),
            Err(SimError::InvalidWire { .. })
        ));
    }

    #[test]
    fn test_attach_after_start_rejected() {
        let mut sim = Simulation::from_part(counter(), EngineConfig::new()).unwrap();
        sim.step().unwrap();
        let monitor = WaveformMonitor::new(Vec::new());
        let err = sim
            .attach_monitor(monitor, [("n", "n")], TimeSource::SimTime)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidState { .. }));
    }

    #[test]
    fn test_export_stats() {
        let mut sim = Simulation::from_part(counter(), EngineConfig::new().with_max_steps(3)).unwrap();
        sim.run().unwrap();
        let stats = sim.export_stats();
        assert_eq!(stats["engine"]["steps_executed"], 3);
        assert_eq!(stats["engine"]["behaviors_fired"], 3);
        assert_eq!(stats["engine"]["state"], "completed");
        assert_eq!(stats["design"]["execution"], "leaf");
    }
}
