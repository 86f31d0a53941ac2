//! Error types for elaboration and simulation.

use thiserror::Error;

use crate::types::{SimTime, Step};
use crate::value::ValueType;

/// Errors raised while assembling a design or running a simulation.
///
/// Construction-time kinds (`FanInViolation`, `Cycle`, `Scheduling`, ...) are
/// reported before any step executes. Per-step kinds raised by a behavior are
/// wrapped in [`SimError::PartFailed`], which names the part and the step.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("type mismatch on port '{port}': declared {expected}, got {found}")]
    TypeMismatch {
        port: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("port '{port}' written twice in step {step}")]
    Overwrite { port: String, step: Step },

    #[error("transient port '{port}' read in step {step} without being updated")]
    StaleRead { port: String, step: Step },

    #[error("port '{port}' read before any value was assigned")]
    Uninitialized { port: String },

    #[error("port '{port}' is an input and cannot be written by its owner")]
    ReadOnlyPort { port: String },

    #[error("fan-in violation: '{destination}' is driven by '{existing}', cannot also be driven by '{rejected}'")]
    FanInViolation {
        destination: String,
        existing: String,
        rejected: String,
    },

    #[error("containment cycle: {path}")]
    Cycle { path: String },

    #[error("dump time went backwards on '{signal}': {time} < {last}")]
    MonitorTimeOrder { signal: String, time: u64, last: u64 },

    #[error("part '{part}' schedules on unknown port '{port}'")]
    Scheduling { part: String, port: String },

    #[error("unknown part '{0}'")]
    UnknownPart(String),

    #[error("unknown port '{0}'")]
    UnknownPort(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("duplicate name '{name}' in '{scope}'")]
    DuplicateName { scope: String, name: String },

    #[error("invalid wire {from} -> {to}: {reason}")]
    InvalidWire {
        from: String,
        to: String,
        reason: String,
    },

    #[error("time source '{port}' holds {found}, expected an integer or real time")]
    InvalidTimeSource { port: String, found: String },

    #[error("part '{0}' has no children")]
    NotComposite(String),

    #[error("simulated time overflows at step {step} with time step {time_step}")]
    TimeOverflow { step: Step, time_step: SimTime },

    #[error("simulation is {state}, cannot {action}")]
    InvalidState { state: String, action: String },

    #[error("event queue '{0}' is closed")]
    QueueClosed(String),

    #[error("part '{part}' failed at step {step}: {error}")]
    PartFailed {
        part: String,
        step: Step,
        #[source]
        error: Box<SimError>,
    },

    #[error("{0}")]
    Behavior(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Convenience constructor for errors raised by user behaviors.
    pub fn behavior(msg: impl Into<String>) -> Self {
        SimError::Behavior(msg.into())
    }

    /// Returns the innermost error, looking through `PartFailed` wrappers.
    pub fn root(&self) -> &SimError {
        match self {
            SimError::PartFailed { error, .. } => error.root(),
            other => other,
        }
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_failed_message() {
        let err = SimError::PartFailed {
            part: "tb.dut".to_string(),
            step: 7,
            error: Box::new(SimError::Overwrite {
                port: "out_0".to_string(),
                step: 7,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("tb.dut"));
        assert!(msg.contains("step 7"));
        assert!(matches!(err.root(), SimError::Overwrite { .. }));
    }
}
