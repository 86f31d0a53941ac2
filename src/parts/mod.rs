//! Built-in part library.
//!
//! Ready-made parts for digital testbenches. Each constructor returns a
//! [`Part`](crate::part::Part) declaration with its ports, schedule and class
//! name set; the behaviors are public for reuse in custom parts.
//!
//! ## Clocks
//! - [`clock`] - toggles `clk` on each external time event
//! - [`free_running_clock`] - toggles `clk` every step
//!
//! ## Stimulus and checking
//! - [`source`] - reset and data patterns on rising clock edges
//! - [`register`] - single-bit register with synchronous reset
//! - [`sink`] - terminal consumer
//!
//! ## Gates
//! - [`and_gate`], [`or_gate`], [`xor_gate`], [`not_gate`]

pub mod clock;
pub mod gates;
pub mod register;
pub mod sink;
pub mod stimulus;

pub use clock::{clock, free_running_clock, ClockBehavior, FreeRunningClockBehavior};
pub use gates::{and_gate, gate, not_gate, or_gate, xor_gate, GateBehavior, GateOp, NotBehavior};
pub use register::{register, RegisterBehavior, REGISTER_BEHAVIOR};
pub use sink::{sink, SinkBehavior};
pub use stimulus::{source, source_with, StimulusBehavior, DEFAULT_DATA_PERIOD, DEFAULT_RESET_CYCLES};
