//! Terminal consumer.

use crate::behavior::{Behavior, PartContext};
use crate::error::SimResult;
use crate::part::Part;
use crate::port::PortSpec;
use crate::schedule::Schedule;

/// Traces every value received on `in_0`.
#[derive(Debug, Default)]
pub struct SinkBehavior {
    received: u64,
}

impl SinkBehavior {
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl Behavior for SinkBehavior {
    fn init(&mut self) {
        self.received = 0;
    }

    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let value = ctx.read("in_0")?;
        self.received += 1;
        ctx.trace(format!("sink -> receive {}", value));
        Ok(())
    }
}

pub fn sink(name: impl Into<String>) -> Part {
    Part::leaf(name, SinkBehavior::default())
        .with_class("Sink")
        .with_port(PortSpec::input("in_0").logic())
        .with_schedule(Schedule::any_updated(["in_0"]))
}
