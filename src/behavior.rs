//! Part behaviors and the context they run in.
//!
//! A leaf part owns one [`Behavior`]. The engine calls [`Behavior::behave`] at
//! most once per step, when the part's schedule says it is eligible. The
//! behavior sees only its own ports, through [`PartContext`].
//!
//! Edge filtering is a wrapper: [`EdgeTriggered`] remembers the last value it
//! observed on a reference port and only forwards to the inner behavior on the
//! requested transition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{SimError, SimResult};
use crate::logic::Logic;
use crate::port::Port;
use crate::types::{SimTime, Step};
use crate::value::{Value, ValueType};

/// The behavior routine of a leaf part.
pub trait Behavior: Send {
    /// Resets internal state. Called once before the first step.
    fn init(&mut self) {}

    /// Runs the behavior for the current step.
    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()>;

    /// Source text describing the behavior, consumed by code generation.
    fn source(&self) -> Option<&str> {
        None
    }

    /// Port names the behavior observes outside of its schedule.
    ///
    /// Checked against the part's ports during elaboration.
    fn watched_ports(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A behavior's view of its part during one step.
pub struct PartContext<'a> {
    part: &'a str,
    ports: &'a mut [Port],
    index: &'a HashMap<String, usize>,
    step: Step,
    time: SimTime,
    stop: &'a AtomicBool,
}

impl<'a> PartContext<'a> {
    pub(crate) fn new(
        part: &'a str,
        ports: &'a mut [Port],
        index: &'a HashMap<String, usize>,
        step: Step,
        time: SimTime,
        stop: &'a AtomicBool,
    ) -> Self {
        Self {
            part,
            ports,
            index,
            step,
            time,
            stop,
        }
    }

    /// Full path of the running part.
    pub fn part_name(&self) -> &str {
        self.part
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    fn slot(&self, name: &str) -> SimResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownPort(format!("{}.{}", self.part, name)))
    }

    /// Reads a port, honoring its persistence semantic.
    pub fn read(&self, name: &str) -> SimResult<Value> {
        let slot = self.slot(name)?;
        self.ports[slot].read(self.step)
    }

    /// Reads a logic-typed port.
    pub fn read_logic(&self, name: &str) -> SimResult<Logic> {
        let value = self.read(name)?;
        value.as_logic().ok_or_else(|| SimError::TypeMismatch {
            port: name.to_string(),
            expected: ValueType::Logic,
            found: value.value_type(),
        })
    }

    /// Current value of a port without update checks.
    pub fn peek(&self, name: &str) -> SimResult<Option<Value>> {
        let slot = self.slot(name)?;
        Ok(self.ports[slot].peek())
    }

    pub fn is_updated(&self, name: &str) -> SimResult<bool> {
        let slot = self.slot(name)?;
        Ok(self.ports[slot].is_updated())
    }

    /// Writes an output port. At most one write per port per step.
    pub fn write(&mut self, name: &str, value: impl Into<Value>) -> SimResult<()> {
        let slot = self.slot(name)?;
        self.ports[slot].write(value.into(), self.step)
    }

    /// Asks the engine to stop at the next step boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Emits a trace record tagged with the part and step.
    pub fn trace(&self, message: impl AsRef<str>) {
        tracing::trace!(part = self.part, step = self.step, "{}", message.as_ref());
    }
}

/// A behavior built from a closure.
pub struct FnBehavior<F> {
    func: F,
    source: Option<String>,
}

impl<F> FnBehavior<F>
where
    F: FnMut(&mut PartContext<'_>) -> SimResult<()> + Send,
{
    pub fn new(func: F) -> Self {
        Self { func, source: None }
    }

    /// Attaches the description used by code generation.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl<F> Behavior for FnBehavior<F>
where
    F: FnMut(&mut PartContext<'_>) -> SimResult<()> + Send,
{
    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        (self.func)(ctx)
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Transition that triggers an edge-filtered behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Low (`0`/`L`) to high (`1`/`H`)
    Rising,
    /// High to low
    Falling,
    /// Either of the above
    Any,
}

impl Edge {
    pub fn is_transition(self, previous: Logic, current: Logic) -> bool {
        let rising = previous.is_low() && current.is_high();
        let falling = previous.is_high() && current.is_low();
        match self {
            Edge::Rising => rising,
            Edge::Falling => falling,
            Edge::Any => rising || falling,
        }
    }
}

/// Runs the inner behavior only on an edge of a reference port.
///
/// The last observed value is kept here rather than derived from the port's
/// updated flag, since a persistent port is not marked updated every step.
pub struct EdgeTriggered<B> {
    inner: B,
    port: String,
    edge: Edge,
    last: Logic,
}

impl<B: Behavior> EdgeTriggered<B> {
    pub fn new(edge: Edge, port: impl Into<String>, inner: B) -> Self {
        Self {
            inner,
            port: port.into(),
            edge,
            last: Logic::U,
        }
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Behavior> Behavior for EdgeTriggered<B> {
    fn init(&mut self) {
        self.last = Logic::U;
        self.inner.init();
    }

    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let current = ctx
            .peek(&self.port)?
            .and_then(|v| v.as_logic())
            .unwrap_or(Logic::U);
        let previous = std::mem::replace(&mut self.last, current);
        if self.edge.is_transition(previous, current) {
            self.inner.behave(ctx)
        } else {
            Ok(())
        }
    }

    fn source(&self) -> Option<&str> {
        self.inner.source()
    }

    fn watched_ports(&self) -> Vec<&str> {
        let mut ports = self.inner.watched_ports();
        ports.push(self.port.as_str());
        ports
    }
}

pub fn rising_edge<B: Behavior>(port: impl Into<String>, inner: B) -> EdgeTriggered<B> {
    EdgeTriggered::new(Edge::Rising, port, inner)
}

pub fn falling_edge<B: Behavior>(port: impl Into<String>, inner: B) -> EdgeTriggered<B> {
    EdgeTriggered::new(Edge::Falling, port, inner)
}

pub fn any_edge<B: Behavior>(port: impl Into<String>, inner: B) -> EdgeTriggered<B> {
    EdgeTriggered::new(Edge::Any, port, inner)
}
