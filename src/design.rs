//! Elaborated designs.
//!
//! Elaboration turns a [`Part`] tree into a [`Design`]: an arena of
//! [`PartNode`]s plus a [`WireTable`]. Nodes are stored in pre-order, so the
//! subtree of any node is the contiguous slice starting at that node and
//! spanning `span` entries. Executors rely on this to hand disjoint subtrees
//! to different threads.
//!
//! All construction-time checks run here: duplicate names, schedule
//! references, wire directions, wire types and fan-in.

use std::collections::HashMap;

use crate::behavior::{Behavior, PartContext};
use crate::error::{SimError, SimResult};
use crate::executor::StepFrame;
use crate::part::{Part, PartBody, WireSpec};
use crate::port::{Direction, Port, UpdateOrigin};
use crate::schedule::{Execution, ResolvedSchedule};
use crate::types::{PartId, PortId, Step};
use crate::value::Value;
use crate::wire::{Propagation, WireConflict, WireTable};

pub(crate) enum NodeBody {
    Leaf { behavior: Box<dyn Behavior> },
    Composite { execution: Execution },
}

/// One part instance inside a [`Design`].
pub struct PartNode {
    name: String,
    path: String,
    class: String,
    parent: Option<PartId>,
    children: Vec<PartId>,
    child_index: HashMap<String, PartId>,
    pub(crate) span: usize,
    pub(crate) ports: Vec<Port>,
    pub(crate) port_index: HashMap<String, usize>,
    pub(crate) schedule: ResolvedSchedule,
    pub(crate) body: NodeBody,
}

impl PartNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the top part, including the top's name.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn children(&self) -> &[PartId] {
        &self.children
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.port_index.get(name).map(|&i| &self.ports[i])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    pub fn execution(&self) -> Option<Execution> {
        match self.body {
            NodeBody::Composite { execution } => Some(execution),
            NodeBody::Leaf { .. } => None,
        }
    }

    /// Whether the scheduling predicate holds for the current port state.
    pub fn is_ready(&self) -> bool {
        self.schedule.is_ready(&self.ports)
    }

    /// Runs the leaf behavior once. Errors are tagged with this part and the step.
    pub(crate) fn fire(&mut self, frame: &StepFrame<'_>) -> SimResult<()> {
        let NodeBody::Leaf { behavior } = &mut self.body else {
            return Ok(());
        };
        let mut ctx = PartContext::new(
            &self.path,
            &mut self.ports,
            &self.port_index,
            frame.step,
            frame.time,
            frame.stop,
        );
        behavior
            .behave(&mut ctx)
            .map_err(|error| SimError::PartFailed {
                part: self.path.clone(),
                step: frame.step,
                error: Box::new(error),
            })
    }
}

/// An elaborated, runnable part tree with its wiring.
pub struct Design {
    parts: Vec<PartNode>,
    wires: WireTable,
}

impl Design {
    /// Elaborates `top`, validating every construction-time invariant.
    pub fn new(top: Part) -> SimResult<Self> {
        let mut design = Self {
            parts: Vec::new(),
            wires: WireTable::new(),
        };
        design.add(top, None)?;
        tracing::debug!(
            parts = design.parts.len(),
            wires = design.wires.len(),
            "design elaborated"
        );
        Ok(design)
    }

    fn add(&mut self, part: Part, parent: Option<PartId>) -> SimResult<PartId> {
        let (name, class, specs, schedule, body) = part.into_parts();
        if name.is_empty() || name.contains('.') {
            return Err(SimError::InvalidName {
                name,
                reason: "part names must be non-empty and must not contain '.'".to_string(),
            });
        }
        let path = match parent {
            Some(p) => format!("{}.{}", self.parts[p].path, name),
            None => name.clone(),
        };

        let mut ports = Vec::with_capacity(specs.len());
        let mut port_index = HashMap::new();
        for spec in specs {
            if spec.name.is_empty() || spec.name.contains('.') {
                return Err(SimError::InvalidName {
                    name: format!("{}.{}", path, spec.name),
                    reason: "port names must be non-empty and must not contain '.'".to_string(),
                });
            }
            if port_index.insert(spec.name.clone(), ports.len()).is_some() {
                return Err(SimError::DuplicateName {
                    scope: path,
                    name: spec.name,
                });
            }
            ports.push(Port::new(spec)?);
        }

        let resolved = schedule.resolve(&path, &port_index)?;
        let (node_body, children, wires) = match body {
            PartBody::Leaf { behavior } => {
                if let Some(port) = behavior
                    .watched_ports()
                    .into_iter()
                    .find(|p| !port_index.contains_key(*p))
                {
                    return Err(SimError::Scheduling {
                        part: path,
                        port: port.to_string(),
                    });
                }
                (NodeBody::Leaf { behavior }, Vec::new(), Vec::new())
            }
            PartBody::Composite {
                children,
                wires,
                execution,
            } => (NodeBody::Composite { execution }, children, wires),
        };

        let id = self.parts.len();
        self.parts.push(PartNode {
            name,
            path,
            class,
            parent,
            children: Vec::new(),
            child_index: HashMap::new(),
            span: 1,
            ports,
            port_index,
            schedule: resolved,
            body: node_body,
        });

        for child in children {
            if self.parts[id].child_index.contains_key(child.name()) {
                return Err(SimError::DuplicateName {
                    scope: self.parts[id].path.clone(),
                    name: child.name().to_string(),
                });
            }
            let child_name = child.name().to_string();
            let child_id = self.add(child, Some(id))?;
            let node = &mut self.parts[id];
            node.children.push(child_id);
            node.child_index.insert(child_name, child_id);
        }
        self.parts[id].span = self.parts.len() - id;

        for wire in &wires {
            self.connect(id, wire)?;
        }
        Ok(id)
    }

    fn scope_port(&self, scope: PartId, path: &str) -> SimResult<(PortId, bool)> {
        let node = &self.parts[scope];
        let unknown = || SimError::UnknownPort(format!("{}.{}", node.path, path));
        match path.split_once('.') {
            None => {
                let index = *node.port_index.get(path).ok_or_else(unknown)?;
                Ok((PortId::new(scope, index), true))
            }
            Some((child, port)) => {
                let child_id = *node
                    .child_index
                    .get(child)
                    .ok_or_else(|| SimError::UnknownPart(format!("{}.{}", node.path, child)))?;
                let index = *self.parts[child_id]
                    .port_index
                    .get(port)
                    .ok_or_else(unknown)?;
                Ok((PortId::new(child_id, index), false))
            }
        }
    }

    fn connect(&mut self, scope: PartId, wire: &WireSpec) -> SimResult<()> {
        let invalid = |reason: &str| SimError::InvalidWire {
            from: wire.from.clone(),
            to: wire.to.clone(),
            reason: reason.to_string(),
        };

        let (src, src_own) = self.scope_port(scope, &wire.from)?;
        let (dst, dst_own) = self.scope_port(scope, &wire.to)?;
        let src_port = self.port(src);
        let dst_port = self.port(dst);

        let src_ok = if src_own {
            src_port.direction() == Direction::In
        } else {
            src_port.direction() == Direction::Out
        };
        if !src_ok {
            return Err(invalid(
                "source must be a child output or an input of the enclosing part",
            ));
        }
        let dst_ok = if dst_own {
            dst_port.direction() == Direction::Out
        } else {
            dst_port.direction() == Direction::In
        };
        if !dst_ok {
            return Err(invalid(
                "destination must be a child input or an output of the enclosing part",
            ));
        }
        if let (Some(a), Some(b)) = (src_port.value_type(), dst_port.value_type()) {
            if a != b {
                return Err(invalid(&format!("type mismatch: {} into {}", a, b)));
            }
        }

        match self.wires.connect(src, dst) {
            Ok(()) => Ok(()),
            Err(WireConflict::Duplicate) => Err(invalid("duplicate wire")),
            Err(WireConflict::FanIn { existing }) => Err(SimError::FanInViolation {
                destination: self.port_path(dst),
                existing: self.port_path(existing),
                rejected: self.port_path(src),
            }),
        }
    }

    pub fn top(&self) -> &PartNode {
        &self.parts[0]
    }

    pub fn part(&self, id: PartId) -> &PartNode {
        &self.parts[id]
    }

    /// All parts in pre-order.
    pub fn parts(&self) -> &[PartNode] {
        &self.parts
    }

    pub fn leaf_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_leaf()).count()
    }

    pub fn wires(&self) -> &WireTable {
        &self.wires
    }

    /// Finds a part by its path relative to the top part. The empty path is
    /// the top part itself.
    pub fn find_part(&self, path: &str) -> Option<PartId> {
        if path.is_empty() {
            return Some(0);
        }
        path.split('.').try_fold(0, |id, name| {
            self.parts[id].child_index.get(name).copied()
        })
    }

    /// Resolves `part.path.port` relative to the top part. A bare name refers
    /// to a port of the top part.
    pub fn resolve_port(&self, path: &str) -> SimResult<PortId> {
        let (part_path, port) = path.rsplit_once('.').unwrap_or(("", path));
        let part = self
            .find_part(part_path)
            .ok_or_else(|| SimError::UnknownPart(part_path.to_string()))?;
        let index = self.parts[part]
            .port_index
            .get(port)
            .copied()
            .ok_or_else(|| SimError::UnknownPort(path.to_string()))?;
        Ok(PortId::new(part, index))
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.parts[id.part].ports[id.index]
    }

    /// Full dotted path of a port, including the top part's name.
    pub fn port_path(&self, id: PortId) -> String {
        format!("{}.{}", self.parts[id.part].path, self.port(id).name())
    }

    pub fn peek(&self, path: &str) -> SimResult<Option<Value>> {
        Ok(self.port(self.resolve_port(path)?).peek())
    }

    pub fn is_updated(&self, path: &str) -> SimResult<bool> {
        Ok(self.port(self.resolve_port(path)?).is_updated())
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [PartNode] {
        &mut self.parts
    }

    pub(crate) fn inject(&mut self, id: PortId, value: Value, step: Step) -> SimResult<()> {
        let path = self.port_path(id);
        self.parts[id.part].ports[id.index]
            .inject(value, step)
            .map_err(|error| SimError::PartFailed {
                part: path,
                step,
                error: Box::new(error),
            })
    }

    /// Resets ports to their initial values and re-initializes behaviors.
    pub(crate) fn reset(&mut self) {
        for node in &mut self.parts {
            node.ports.iter_mut().for_each(Port::reset);
            if let NodeBody::Leaf { behavior } = &mut node.body {
                behavior.init();
            }
        }
    }

    /// Clears update flags and lands values delivered by the last propagation.
    pub(crate) fn begin_step(&mut self) {
        for node in &mut self.parts {
            node.ports.iter_mut().for_each(Port::begin_step);
        }
    }

    /// Stages the values of updated wire sources into their destinations.
    ///
    /// Returns the number of deliveries.
    pub(crate) fn propagate(&mut self, mode: Propagation) -> usize {
        let mut deliveries = Vec::new();
        for (src, _) in self.wires.iter() {
            let port = self.port(src);
            let forward = match (mode, port.origin()) {
                (_, None) => false,
                (Propagation::SingleHop, Some(_)) => true,
                (Propagation::Transitive, Some(origin)) => origin == UpdateOrigin::Written,
            };
            if let (true, Some(value)) = (forward, port.peek()) {
                self.wires
                    .collect_deliveries(src, value, mode, &mut deliveries);
            }
        }
        let count = deliveries.len();
        for (dst, value) in deliveries {
            self.parts[dst.part].ports[dst.index].stage(value);
        }
        count
    }
}

impl std::fmt::Debug for Design {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Design")
            .field("top", &self.top().path)
            .field("parts", &self.parts.len())
            .field("wires", &self.wires.len())
            .finish()
    }
}
