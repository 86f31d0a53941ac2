//! # Kairo
//!
//! A discrete-time simulation core for digital hardware models.
//!
//! ## Design Principles
//!
//! - **Parts and ports**: a design is a tree of [`Part`]s. Leaves run a
//!   [`Behavior`]; composites own children and the wires between them.
//!   Ports carry typed values with persistent or transient semantics.
//! - **Explicit steps**: a global stepper advances simulated time in fixed
//!   increments. Within a step every eligible part runs once, then updated
//!   outputs travel over wires and land in the next step.
//! - **No shared mutable state**: a part writes only its own output ports
//!   and every destination has a single driver, so children of a concurrent
//!   composite can run in parallel without locks.
//! - **Offline tooling**: waveform dumps in VCD format, VHDL generation from
//!   part declarations, and structural snapshots for diagram tools.
//!
//! ## Features
//!
//! - `parallel` - Run concurrent composites on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::{parts, EngineConfig, Execution, Logic, Part, Simulation};
//!
//! let top = Part::composite("tb", Execution::Sequential)
//!     .with_child(parts::free_running_clock("clock"))
//!     .with_child(parts::not_gate("inv"))
//!     .wire("clock.clk", "inv.a");
//!
//! let mut sim = Simulation::from_part(top, EngineConfig::new().with_max_steps(4)).unwrap();
//! let summary = sim.run().unwrap();
//! assert_eq!(summary.steps, 4);
//!
//! // clk drove 0, 1, 0, 1; wires deliver one step later, so the inverter
//! // last saw 0
//! let y = sim.design().peek("inv.y").unwrap();
//! assert_eq!(y, Some(Logic::One.into()));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use kairo::{config::SimConfig, registry::create_default_registry};
//!
//! let config = SimConfig::from_file("testbench.yaml")?;
//! let mut sim = config.build_simulation(&create_default_registry())?;
//! sim.run()?;
//! ```

pub mod behavior;
pub mod codegen;
pub mod config;
pub mod design;
pub mod engine;
pub mod error;
pub mod event;
pub mod executor;
pub mod logic;
pub mod monitor;
pub mod part;
pub mod parts;
pub mod port;
pub mod registry;
pub mod schedule;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod types;
pub mod value;
pub mod vcd;
pub mod wire;

// Re-export commonly used types
pub use behavior::{any_edge, falling_edge, rising_edge, Behavior, Edge, EdgeTriggered, FnBehavior, PartContext};
pub use codegen::{generate, CodegenError, CodegenOptions, GeneratedHdl, HdlLanguage, Translator};
pub use config::{ConfigError, ConfigResult, SimConfig, SimConfigBuilder};
pub use design::{Design, PartNode};
pub use engine::{EngineConfig, EngineState, RunLimits, RunSummary, Simulation, StopReason};
pub use error::{SimError, SimResult};
pub use event::{Event, EventQueue, EventSender, OnFull, PushOutcome, QueueDirection};
pub use executor::StepTally;
pub use logic::Logic;
pub use monitor::{TimeSource, WaveformMonitor};
pub use part::{Part, WireSpec};
pub use port::{Direction, Port, PortSpec, Semantic};
pub use registry::{create_default_registry, PartRegistry};
pub use schedule::{Execution, Schedule};
pub use snapshot::Snapshot;
pub use source::{StopHandle, Timer, TimerReport};
pub use stats::{EngineStats, SimulationStats, StatsCollector, Stopwatch};
pub use types::{PartId, PortId, SimTime, Step};
pub use value::{Value, ValueType};
pub use wire::Propagation;

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// kairo::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
