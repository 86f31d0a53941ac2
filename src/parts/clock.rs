//! Clock generators.

use crate::behavior::{Behavior, PartContext};
use crate::error::SimResult;
use crate::logic::Logic;
use crate::part::Part;
use crate::port::PortSpec;
use crate::schedule::Schedule;

fn next_level(state: Logic) -> Logic {
    if state == Logic::U {
        Logic::Zero
    } else {
        !state
    }
}

/// Event-driven clock.
///
/// Each value arriving on `time` is re-emitted on `time_port` and toggles
/// `clk`. The first toggle drives `0`, so the first rising edge comes with
/// the second event.
#[derive(Debug, Default)]
pub struct ClockBehavior {
    state: Logic,
}

impl ClockBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Logic {
        self.state
    }
}

impl Behavior for ClockBehavior {
    fn init(&mut self) {
        self.state = Logic::U;
    }

    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let time = ctx.read("time")?;
        ctx.write("time_port", time)?;
        let next = next_level(self.state);
        ctx.write("clk", next)?;
        ctx.trace(format!("clock@{} -> drive {} -> {}", time, self.state, next));
        self.state = next;
        Ok(())
    }
}

/// Clock driven by external time events on its `time` input.
pub fn clock(name: impl Into<String>) -> Part {
    Part::leaf(name, ClockBehavior::new())
        .with_class("Clock")
        .with_port(PortSpec::input("time").transient())
        .with_port(PortSpec::output("clk").logic())
        .with_port(PortSpec::output("time_port"))
        .with_schedule(Schedule::any_updated(["time"]))
}

/// Clock toggling on every step, with no inputs.
#[derive(Debug, Default)]
pub struct FreeRunningClockBehavior {
    state: Logic,
}

impl Behavior for FreeRunningClockBehavior {
    fn init(&mut self) {
        self.state = Logic::U;
    }

    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        self.state = next_level(self.state);
        ctx.write("clk", self.state)
    }
}

pub fn free_running_clock(name: impl Into<String>) -> Part {
    Part::leaf(name, FreeRunningClockBehavior::default())
        .with_class("FreeRunningClock")
        .with_port(PortSpec::output("clk").logic())
}
