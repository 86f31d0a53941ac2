//! Reset and data stimulus for clocked designs.

use crate::behavior::{rising_edge, Behavior, PartContext};
use crate::error::SimResult;
use crate::logic::Logic;
use crate::part::Part;
use crate::port::PortSpec;
use crate::schedule::Schedule;

pub const DEFAULT_RESET_CYCLES: u64 = 5;
pub const DEFAULT_DATA_PERIOD: u64 = 4;

/// Drives `rst` high for the first `reset_cycles` rising edges and `out_0`
/// high on every `data_period`-th edge, starting with the first.
#[derive(Debug)]
pub struct StimulusBehavior {
    reset_cycles: u64,
    data_period: u64,
    cycle: u64,
}

impl StimulusBehavior {
    /// A zero `data_period` is treated as one.
    pub fn new(reset_cycles: u64, data_period: u64) -> Self {
        Self {
            reset_cycles,
            data_period: data_period.max(1),
            cycle: 0,
        }
    }

    /// Number of rising edges seen so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

impl Default for StimulusBehavior {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_CYCLES, DEFAULT_DATA_PERIOD)
    }
}

impl Behavior for StimulusBehavior {
    fn init(&mut self) {
        self.cycle = 0;
    }

    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let rst = Logic::from(self.cycle < self.reset_cycles);
        let data = Logic::from(self.cycle % self.data_period == 0);
        ctx.write("rst", rst)?;
        ctx.write("out_0", data)?;
        ctx.trace(format!("source@cycle {} -> rst={}, out_0={}", self.cycle, rst, data));
        self.cycle += 1;
        Ok(())
    }
}

/// Stimulus part with the default reset length and data period.
pub fn source(name: impl Into<String>) -> Part {
    source_with(name, DEFAULT_RESET_CYCLES, DEFAULT_DATA_PERIOD)
}

pub fn source_with(name: impl Into<String>, reset_cycles: u64, data_period: u64) -> Part {
    Part::leaf(
        name,
        rising_edge("clk", StimulusBehavior::new(reset_cycles, data_period)),
    )
    .with_class("Source")
    .with_port(PortSpec::input("clk").logic())
    .with_port(PortSpec::output("rst").logic())
    .with_port(PortSpec::output("out_0").logic())
    .with_schedule(Schedule::all_updated(["clk"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_clamped() {
        let b = StimulusBehavior::new(2, 0);
        assert_eq!(b.data_period, 1);
    }

    #[test]
    fn test_source_ports() {
        let part = source("src");
        assert_eq!(part.class(), "Source");
        let outputs: Vec<_> = part
            .ports_by_direction()
            .skip(1)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(outputs, vec!["rst", "out_0"]);
    }
}
