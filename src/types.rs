//! Core type definitions for the simulation core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time unit.
///
/// Time advances by a fixed `time_step` per simulation step, so every step
/// boundary maps to exactly one `SimTime`.
pub type SimTime = u64;

/// Index of a simulation step, counted from zero.
pub type Step = u64;

/// Arena index of an elaborated part.
pub type PartId = usize;

/// Identifies a port inside an elaborated design: the owning part plus the
/// position of the port in that part's declaration list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId {
    /// Owning part
    pub part: PartId,
    /// Index within the owner's port list
    pub index: usize,
}

impl PortId {
    pub fn new(part: PartId, index: usize) -> Self {
        Self { part, index }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.part, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_id_ordering() {
        let a = PortId::new(0, 3);
        let b = PortId::new(1, 0);
        assert!(a < b);
        assert_eq!(a.to_string(), "0:3");
    }
}
