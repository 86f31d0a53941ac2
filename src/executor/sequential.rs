//! Sequential execution: children run in declaration order.
//!
//! The order is fixed for the life of the design, so traces are reproducible
//! run to run. The first failing child aborts the step.

use crate::design::PartNode;
use crate::error::SimResult;
use crate::executor::{execute, ExecutionStrategy, StepFrame, StepTally};

/// Runs children one after another.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialStrategy;

impl ExecutionStrategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run_children(&self, children: Vec<&mut [PartNode]>, frame: &StepFrame<'_>) -> SimResult<StepTally> {
        let mut tally = StepTally::default();
        for child in children {
            tally += execute(child, frame)?;
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::FnBehavior;
    use crate::design::Design;
    use crate::error::SimError;
    use crate::part::Part;
    use crate::port::PortSpec;
    use crate::schedule::Execution;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_declaration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut top = Part::composite("top", Execution::Sequential);
        for name in ["c", "a", "b"] {
            let order = Arc::clone(&order);
            top = top.with_child(Part::leaf(
                name,
                FnBehavior::new(move |ctx| {
                    order.lock().push(ctx.part_name().to_string());
                    Ok(())
                }),
            ));
        }

        let mut design = Design::new(top).unwrap();
        let stop = AtomicBool::new(false);
        let frame = StepFrame::new(0, 0, &stop);
        let tally = execute(design.nodes_mut(), &frame).unwrap();

        assert_eq!(tally.fired, 3);
        assert_eq!(*order.lock(), vec!["top.c", "top.a", "top.b"]);
    }

    #[test]
    fn test_first_failure_aborts() {
        let failing = Part::leaf(
            "bad",
            FnBehavior::new(|ctx| {
                ctx.write("q", 1_i64)?;
                ctx.write("q", 2_i64)
            }),
        )
        .with_port(PortSpec::output("q"));
        let top = Part::composite("top", Execution::Sequential).with_child(failing);

        let mut design = Design::new(top).unwrap();
        let stop = AtomicBool::new(false);
        let frame = StepFrame::new(3, 30, &stop);
        let err = execute(design.nodes_mut(), &frame).unwrap_err();
        match err {
            SimError::PartFailed { part, step, error } => {
                assert_eq!(part, "top.bad");
                assert_eq!(step, 3);
                assert!(matches!(*error, SimError::Overwrite { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
