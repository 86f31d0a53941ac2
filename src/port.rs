//! Ports: named, typed signal endpoints owned by a part.
//!
//! A port is declared with a [`PortSpec`] and instantiated as a [`Port`] when
//! the design is elaborated. Every port tracks whether it was updated during
//! the current step; the flag is cleared at the start of each step and set
//! exactly once, either by the owner's write or by a value arriving over a
//! wire.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SimError, SimResult};
use crate::logic::Logic;
use crate::types::Step;
use crate::value::{Value, ValueType};

/// Data direction of a port, seen from its owning part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

/// How long a written value stays readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semantic {
    /// Keeps the last value across steps, like a wired signal.
    #[default]
    Persistent,
    /// Readable only in the step it was updated.
    Transient,
}

/// Static declaration of a port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique within the owning part
    pub name: String,
    /// Data direction
    pub direction: Direction,
    /// Declared value type; `None` accepts any value
    #[serde(default, rename = "type")]
    pub ty: Option<ValueType>,
    /// Persistence semantic
    #[serde(default)]
    pub semantic: Semantic,
    /// Value held before the first write
    #[serde(default)]
    pub init: Option<Value>,
}

impl PortSpec {
    /// Creates an untyped, persistent port declaration.
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            ty: None,
            semantic: Semantic::Persistent,
            init: None,
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, Direction::In)
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, Direction::Out)
    }

    /// Declares the value type.
    pub fn typed(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Shorthand for a logic port starting at `U`.
    pub fn logic(self) -> Self {
        self.typed(ValueType::Logic).with_init(Logic::U)
    }

    pub fn with_init(mut self, value: impl Into<Value>) -> Self {
        self.init = Some(value.into());
        self
    }

    pub fn transient(mut self) -> Self {
        self.semantic = Semantic::Transient;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.semantic = Semantic::Persistent;
        self
    }

    /// Checks the initial value against the declared type.
    pub fn validate(&self) -> SimResult<()> {
        if let Some(init) = &self.init {
            check_type(&self.name, self.ty, init)?;
        }
        Ok(())
    }
}

fn check_type(port: &str, declared: Option<ValueType>, value: &Value) -> SimResult<()> {
    match declared {
        Some(expected) if expected != value.value_type() => Err(SimError::TypeMismatch {
            port: port.to_string(),
            expected,
            found: value.value_type(),
        }),
        _ => Ok(()),
    }
}

/// Where the current step's update came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpdateOrigin {
    /// Written by the owner or injected by a synchronizer
    Written,
    /// Arrived over a wire
    Delivered,
}

/// A port instance with its runtime state.
#[derive(Clone, Debug)]
pub struct Port {
    spec: PortSpec,
    value: Option<Value>,
    staged: Option<Value>,
    origin: Option<UpdateOrigin>,
}

impl Port {
    /// Instantiates a port from its declaration.
    pub fn new(spec: PortSpec) -> SimResult<Self> {
        spec.validate()?;
        Ok(Self {
            value: spec.init,
            spec,
            staged: None,
            origin: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn direction(&self) -> Direction {
        self.spec.direction
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.spec.ty
    }

    pub fn semantic(&self) -> Semantic {
        self.spec.semantic
    }

    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// Writes a value from the owning part's behavior.
    ///
    /// Fails on input ports, on a declared-type mismatch, and on a second
    /// update within the same step.
    pub fn write(&mut self, value: Value, step: Step) -> SimResult<()> {
        if self.spec.direction == Direction::In {
            return Err(SimError::ReadOnlyPort {
                port: self.spec.name.clone(),
            });
        }
        self.assign(value, step)
    }

    /// Assigns a value regardless of direction. Used for synchronizer targets.
    pub(crate) fn inject(&mut self, value: Value, step: Step) -> SimResult<()> {
        self.assign(value, step)
    }

    fn assign(&mut self, value: Value, step: Step) -> SimResult<()> {
        check_type(&self.spec.name, self.spec.ty, &value)?;
        if self.origin.is_some() {
            return Err(SimError::Overwrite {
                port: self.spec.name.clone(),
                step,
            });
        }
        self.value = Some(value);
        self.origin = Some(UpdateOrigin::Written);
        Ok(())
    }

    /// Reads the value.
    ///
    /// Persistent ports return their last value unconditionally; transient
    /// ports fail with `StaleRead` unless updated in this step.
    pub fn read(&self, step: Step) -> SimResult<Value> {
        if self.spec.semantic == Semantic::Transient && !self.is_updated() {
            return Err(SimError::StaleRead {
                port: self.spec.name.clone(),
                step,
            });
        }
        self.value.ok_or_else(|| SimError::Uninitialized {
            port: self.spec.name.clone(),
        })
    }

    /// Returns the current value without checking update state.
    pub fn peek(&self) -> Option<Value> {
        self.value
    }

    /// True iff the port was updated during the current step.
    pub fn is_updated(&self) -> bool {
        self.origin.is_some()
    }

    pub(crate) fn origin(&self) -> Option<UpdateOrigin> {
        self.origin
    }

    /// Queues a value delivered over a wire; it lands at the next step start.
    pub(crate) fn stage(&mut self, value: Value) {
        self.staged = Some(value);
    }

    /// Clears the updated flag, then commits any staged delivery.
    pub(crate) fn begin_step(&mut self) {
        self.origin = None;
        if let Some(value) = self.staged.take() {
            self.value = Some(value);
            self.origin = Some(UpdateOrigin::Delivered);
        }
    }

    /// Restores the declared initial state.
    pub(crate) fn reset(&mut self) {
        self.value = self.spec.init;
        self.staged = None;
        self.origin = None;
    }
}
