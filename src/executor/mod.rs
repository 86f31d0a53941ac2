//! Execution strategies for composite parts.
//!
//! The engine executes the design one step at a time by walking the part tree
//! from the top. A composite whose schedule holds hands its children to an
//! [`ExecutionStrategy`]; a leaf whose schedule holds fires its behavior once.
//!
//! Because the design stores parts in pre-order, every child subtree is a
//! contiguous, disjoint slice of the arena. Strategies receive these slices
//! directly, so a concurrent strategy can move them across threads without
//! locks. Writes never collide: each port is owned by exactly one part.

pub mod concurrent;
pub mod sequential;

use std::ops::AddAssign;
use std::sync::atomic::AtomicBool;

use crate::design::{NodeBody, PartNode};
use crate::error::SimResult;
use crate::schedule::Execution;
use crate::types::{SimTime, Step};

pub use concurrent::ConcurrentStrategy;
pub use sequential::SequentialStrategy;

/// Per-step values shared by every part executed in that step.
#[derive(Clone, Copy, Debug)]
pub struct StepFrame<'a> {
    pub step: Step,
    pub time: SimTime,
    pub(crate) stop: &'a AtomicBool,
}

impl<'a> StepFrame<'a> {
    pub(crate) fn new(step: Step, time: SimTime, stop: &'a AtomicBool) -> Self {
        Self { step, time, stop }
    }
}

/// What happened to the leaves during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepTally {
    /// Leaves whose behavior ran
    pub fired: u64,
    /// Leaves not eligible this step, including those under a closed composite
    pub skipped: u64,
}

impl AddAssign for StepTally {
    fn add_assign(&mut self, rhs: Self) {
        self.fired += rhs.fired;
        self.skipped += rhs.skipped;
    }
}

/// Orders the children of a composite within one step.
pub trait ExecutionStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Executes each child subtree once.
    fn run_children(&self, children: Vec<&mut [PartNode]>, frame: &StepFrame<'_>) -> SimResult<StepTally>;
}

/// Returns the strategy implementing `execution`.
pub fn strategy_for(execution: Execution) -> &'static dyn ExecutionStrategy {
    match execution {
        Execution::Sequential => &SequentialStrategy,
        Execution::Concurrent => &ConcurrentStrategy,
    }
}

/// Executes the subtree rooted at `nodes[0]`.
pub(crate) fn execute(nodes: &mut [PartNode], frame: &StepFrame<'_>) -> SimResult<StepTally> {
    let Some((head, rest)) = nodes.split_first_mut() else {
        return Ok(StepTally::default());
    };

    if !head.is_ready() {
        let skipped = std::iter::once(&*head)
            .chain(rest.iter())
            .filter(|n| n.is_leaf())
            .count() as u64;
        tracing::trace!(part = head.path(), step = frame.step, "not scheduled");
        return Ok(StepTally { fired: 0, skipped });
    }

    match head.body {
        NodeBody::Leaf { .. } => {
            head.fire(frame)?;
            tracing::trace!(part = head.path(), step = frame.step, "fired");
            Ok(StepTally { fired: 1, skipped: 0 })
        }
        NodeBody::Composite { execution } => {
            strategy_for(execution).run_children(split_children(rest), frame)
        }
    }
}

/// Splits the descendants of a composite into one slice per direct child.
pub(crate) fn split_children(mut rest: &mut [PartNode]) -> Vec<&mut [PartNode]> {
    let mut children = Vec::new();
    while !rest.is_empty() {
        let span = rest[0].span;
        let (child, tail) = std::mem::take(&mut rest).split_at_mut(span);
        children.push(child);
        rest = tail;
    }
    children
}
