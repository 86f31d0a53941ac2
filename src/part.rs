//! Part declarations.
//!
//! A [`Part`] is either a leaf with a behavior or a composite that owns child
//! parts and the wires between them. Parts are plain values; they become a
//! runnable [`Design`](crate::design::Design) through elaboration, which
//! validates names, schedules and wiring.
//!
//! # Example
//!
//! ```
//! use kairo::{Execution, FnBehavior, Logic, Part, PortSpec, Schedule};
//!
//! let inverter = Part::leaf(
//!     "inv",
//!     FnBehavior::new(|ctx| {
//!         let a = ctx.read_logic("a")?;
//!         ctx.write("y", !a)
//!     }),
//! )
//! .with_port(PortSpec::input("a").logic())
//! .with_port(PortSpec::output("y").logic())
//! .with_schedule(Schedule::all_updated(["a"]));
//!
//! let top = Part::composite("top", Execution::Sequential).with_child(inverter);
//! assert_eq!(top.children().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;
use crate::port::{Direction, PortSpec};
use crate::schedule::{Execution, Schedule};

/// A wire declared inside a composite, by relative port paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSpec {
    /// Source path, e.g. `clock.clk` or a port of the composite itself
    pub from: String,
    /// Destination path
    pub to: String,
}

impl WireSpec {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

pub(crate) enum PartBody {
    Leaf {
        behavior: Box<dyn Behavior>,
    },
    Composite {
        children: Vec<Part>,
        wires: Vec<WireSpec>,
        execution: Execution,
    },
}

/// Declaration of a part and, for composites, its subtree.
pub struct Part {
    name: String,
    class: String,
    ports: Vec<PortSpec>,
    schedule: Schedule,
    pub(crate) body: PartBody,
}

impl Part {
    /// Creates a leaf part running `behavior`.
    pub fn leaf(name: impl Into<String>, behavior: impl Behavior + 'static) -> Self {
        Self::leaf_boxed(name, Box::new(behavior))
    }

    pub fn leaf_boxed(name: impl Into<String>, behavior: Box<dyn Behavior>) -> Self {
        Self {
            name: name.into(),
            class: "Part".to_string(),
            ports: Vec::new(),
            schedule: Schedule::Always,
            body: PartBody::Leaf { behavior },
        }
    }

    /// Creates a composite part with no children yet.
    pub fn composite(name: impl Into<String>, execution: Execution) -> Self {
        Self {
            name: name.into(),
            class: "Composite".to_string(),
            ports: Vec::new(),
            schedule: Schedule::Always,
            body: PartBody::Composite {
                children: Vec::new(),
                wires: Vec::new(),
                execution,
            },
        }
    }

    /// Sets the class name, used by snapshots and as the default entity name.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = PortSpec>) -> Self {
        self.ports.extend(ports);
        self
    }

    /// Sets the scheduling predicate. On a composite it gates the whole subtree.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Adds a child. Ignored with a warning on leaf parts.
    pub fn with_child(mut self, child: Part) -> Self {
        match &mut self.body {
            PartBody::Composite { children, .. } => children.push(child),
            PartBody::Leaf { .. } => {
                tracing::warn!(part = %self.name, child = %child.name, "leaf part cannot own children");
            }
        }
        self
    }

    pub fn with_children(self, children: impl IntoIterator<Item = Part>) -> Self {
        children.into_iter().fold(self, Part::with_child)
    }

    /// Declares a wire between two ports in this composite's scope.
    pub fn wire(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let spec = WireSpec::new(from, to);
        match &mut self.body {
            PartBody::Composite { wires, .. } => wires.push(spec),
            PartBody::Leaf { .. } => {
                tracing::warn!(part = %self.name, from = %spec.from, to = %spec.to, "leaf part cannot own wires");
            }
        }
        self
    }

    pub fn with_execution(mut self, strategy: Execution) -> Self {
        if let PartBody::Composite { execution, .. } = &mut self.body {
            *execution = strategy;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    /// Input ports followed by output ports, each in declaration order.
    pub fn ports_by_direction(&self) -> impl Iterator<Item = &PortSpec> {
        let inputs = self.ports.iter().filter(|p| p.direction == Direction::In);
        let outputs = self.ports.iter().filter(|p| p.direction == Direction::Out);
        inputs.chain(outputs)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, PartBody::Leaf { .. })
    }

    pub fn children(&self) -> &[Part] {
        match &self.body {
            PartBody::Composite { children, .. } => children,
            PartBody::Leaf { .. } => &[],
        }
    }

    pub fn wires(&self) -> &[WireSpec] {
        match &self.body {
            PartBody::Composite { wires, .. } => wires,
            PartBody::Leaf { .. } => &[],
        }
    }

    pub fn execution(&self) -> Option<Execution> {
        match &self.body {
            PartBody::Composite { execution, .. } => Some(*execution),
            PartBody::Leaf { .. } => None,
        }
    }

    /// Source text of a leaf's behavior, if the behavior provides one.
    pub fn behavior_source(&self) -> Option<&str> {
        match &self.body {
            PartBody::Leaf { behavior } => behavior.source(),
            PartBody::Composite { .. } => None,
        }
    }

    pub(crate) fn into_parts(self) -> (String, String, Vec<PortSpec>, Schedule, PartBody) {
        (self.name, self.class, self.ports, self.schedule, self.body)
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("ports", &self.ports)
            .field("schedule", &self.schedule)
            .field("children", &self.children())
            .field("wires", &self.wires())
            .finish()
    }
}
