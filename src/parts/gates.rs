//! Combinational logic gates.
//!
//! Gates recompute whenever one of their inputs is updated and use the
//! nine-value operators of [`Logic`], so unknown inputs propagate as `X`.

use crate::behavior::{Behavior, PartContext};
use crate::error::SimResult;
use crate::logic::Logic;
use crate::part::Part;
use crate::port::PortSpec;
use crate::schedule::Schedule;

/// Two-input gate operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOp {
    And,
    Or,
    Xor,
}

impl GateOp {
    pub fn apply(self, a: Logic, b: Logic) -> Logic {
        match self {
            GateOp::And => a & b,
            GateOp::Or => a | b,
            GateOp::Xor => a ^ b,
        }
    }

    fn class(self) -> &'static str {
        match self {
            GateOp::And => "And",
            GateOp::Or => "Or",
            GateOp::Xor => "Xor",
        }
    }

    fn source(self) -> &'static str {
        match self {
            GateOp::And => "y <= a and b;",
            GateOp::Or => "y <= a or b;",
            GateOp::Xor => "y <= a xor b;",
        }
    }
}

#[derive(Debug)]
pub struct GateBehavior {
    op: GateOp,
}

impl Behavior for GateBehavior {
    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let a = ctx.read_logic("a")?;
        let b = ctx.read_logic("b")?;
        ctx.write("y", self.op.apply(a, b))
    }

    fn source(&self) -> Option<&str> {
        Some(self.op.source())
    }
}

/// A two-input gate with inputs `a`, `b` and output `y`.
pub fn gate(name: impl Into<String>, op: GateOp) -> Part {
    Part::leaf(name, GateBehavior { op })
        .with_class(op.class())
        .with_port(PortSpec::input("a").logic())
        .with_port(PortSpec::input("b").logic())
        .with_port(PortSpec::output("y").logic())
        .with_schedule(Schedule::any_updated(["a", "b"]))
}

pub fn and_gate(name: impl Into<String>) -> Part {
    gate(name, GateOp::And)
}

pub fn or_gate(name: impl Into<String>) -> Part {
    gate(name, GateOp::Or)
}

pub fn xor_gate(name: impl Into<String>) -> Part {
    gate(name, GateOp::Xor)
}

#[derive(Debug, Default)]
pub struct NotBehavior;

impl Behavior for NotBehavior {
    fn behave(&mut self, ctx: &mut PartContext<'_>) -> SimResult<()> {
        let a = ctx.read_logic("a")?;
        ctx.write("y", !a)
    }

    fn source(&self) -> Option<&str> {
        Some("y <= not a;")
    }
}

pub fn not_gate(name: impl Into<String>) -> Part {
    Part::leaf(name, NotBehavior)
        .with_class("Not")
        .with_port(PortSpec::input("a").logic())
        .with_port(PortSpec::output("y").logic())
        .with_schedule(Schedule::any_updated(["a"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_ops() {
        assert_eq!(GateOp::And.apply(Logic::One, Logic::One), Logic::One);
        assert_eq!(GateOp::And.apply(Logic::Zero, Logic::X), Logic::Zero);
        assert_eq!(GateOp::Or.apply(Logic::Zero, Logic::One), Logic::One);
        assert_eq!(GateOp::Xor.apply(Logic::One, Logic::One), Logic::Zero);
        assert_eq!(GateOp::Xor.apply(Logic::One, Logic::U), Logic::X);
    }

    #[test]
    fn test_gate_classes() {
        assert_eq!(and_gate("g").class(), "And");
        assert_eq!(xor_gate("g").class(), "Xor");
        assert_eq!(not_gate("g").class(), "Not");
        assert_eq!(or_gate("g").behavior_source(), Some("y <= a or b;"));
    }
}
