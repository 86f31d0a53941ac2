//! A single-bit register with synchronous reset.

use crate::behavior::{rising_edge, Behavior, PartContext};
use crate::error::SimResult;
use crate::logic::Logic;
use crate::part::Part;
use crate::port::PortSpec;
use crate::schedule::Schedule;

/// Behavior description carried into code generation.
pub const REGISTER_BEHAVIOR: &str = "\
if rst = '1' then
    out_0 <= '0';
else
    out_0 <= in_0;
end if;";

#[derive(Debug, Default)]
pub struct RegisterBehavior;

impl Behavior for RegisterBehavior {
    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        if ctx.read_logic("rst")? == Logic::One {
            ctx.write("out_0", Logic::Zero)
        } else {
            let data = ctx.read_logic("in_0")?;
            ctx.write("out_0", data)
        }
    }

    fn source(&self) -> Option<&str> {
        Some(REGISTER_BEHAVIOR)
    }
}

/// Register sampling `in_0` on the rising edge of `clk`.
pub fn register(name: impl Into<String>) -> Part {
    Part::leaf(name, rising_edge("clk", RegisterBehavior))
        .with_class("Register")
        .with_port(PortSpec::input("clk").logic())
        .with_port(PortSpec::input("rst").logic())
        .with_port(PortSpec::input("in_0").logic())
        .with_port(PortSpec::output("out_0").logic())
        .with_schedule(Schedule::all_updated(["clk"]))
}
