//! Concurrent execution: children may run in parallel within a step.
//!
//! With the `parallel` feature the child subtrees are handed to rayon. Each
//! subtree is a disjoint slice of the design arena and every port has a single
//! owner, so no locking is needed. Without the feature the children run one
//! after another with the same results.
//!
//! Every child runs even if a sibling fails; the error reported is the one
//! from the first failing child in declaration order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::design::PartNode;
use crate::error::SimResult;
use crate::executor::{execute, ExecutionStrategy, StepFrame, StepTally};

/// Runs children in parallel when the `parallel` feature is enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConcurrentStrategy;

impl ExecutionStrategy for ConcurrentStrategy {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    #[cfg(feature = "parallel")]
    fn run_children(&self, children: Vec<&mut [PartNode]>, frame: &StepFrame<'_>) -> SimResult<StepTally> {
        let results: Vec<SimResult<StepTally>> = children
            .into_par_iter()
            .map(|child| execute(child, frame))
            .collect();
        merge(results)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_children(&self, children: Vec<&mut [PartNode]>, frame: &StepFrame<'_>) -> SimResult<StepTally> {
        let results: Vec<SimResult<StepTally>> = children
            .into_iter()
            .map(|child| execute(child, frame))
            .collect();
        merge(results)
    }
}

fn merge(results: Vec<SimResult<StepTally>>) -> SimResult<StepTally> {
    let mut tally = StepTally::default();
    for result in results {
        tally += result?;
    }
    Ok(tally)
}
