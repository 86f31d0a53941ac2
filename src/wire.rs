//! The wiring graph.
//!
//! Wires are kept apart from the containment tree as a side table mapping each
//! source port to its destinations. A destination has exactly one driver;
//! connecting a second one is rejected at assembly time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::PortId;
use crate::value::Value;

/// How far a value travels along wires in one propagation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// One wire per step. A port that received a value forwards it during
    /// the following step's propagation.
    #[default]
    SingleHop,
    /// Relay chains are followed to their ends in the same pass.
    Transitive,
}

/// Reason a connection was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireConflict {
    /// The destination already has this driver.
    Duplicate,
    /// The destination already has a different driver.
    FanIn { existing: PortId },
}

/// Source-to-destinations relation.
#[derive(Clone, Debug, Default)]
pub struct WireTable {
    fanout: BTreeMap<PortId, Vec<PortId>>,
    driver: HashMap<PortId, PortId>,
}

impl WireTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wire from `source` to `destination`.
    pub fn connect(&mut self, source: PortId, destination: PortId) -> Result<(), WireConflict> {
        if let Some(&existing) = self.driver.get(&destination) {
            return Err(if existing == source {
                WireConflict::Duplicate
            } else {
                WireConflict::FanIn { existing }
            });
        }
        self.driver.insert(destination, source);
        self.fanout.entry(source).or_default().push(destination);
        Ok(())
    }

    pub fn destinations(&self, source: PortId) -> &[PortId] {
        self.fanout.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn driver_of(&self, destination: PortId) -> Option<PortId> {
        self.driver.get(&destination).copied()
    }

    pub fn is_source(&self, port: PortId) -> bool {
        self.fanout.contains_key(&port)
    }

    /// Iterates sources in port order with their destinations.
    pub fn iter(&self) -> impl Iterator<Item = (PortId, &[PortId])> {
        self.fanout.iter().map(|(src, dsts)| (*src, dsts.as_slice()))
    }

    /// Number of source-destination pairs.
    pub fn len(&self) -> usize {
        self.driver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.driver.is_empty()
    }

    /// Collects deliveries of `value` from `source`, following relays when
    /// `mode` is transitive.
    pub(crate) fn collect_deliveries(
        &self,
        source: PortId,
        value: Value,
        mode: Propagation,
        out: &mut Vec<(PortId, Value)>,
    ) {
        match mode {
            Propagation::SingleHop => {
                out.extend(self.destinations(source).iter().map(|&dst| (dst, value)));
            }
            Propagation::Transitive => {
                let mut seen = HashSet::from([source]);
                let mut pending = vec![source];
                while let Some(port) = pending.pop() {
                    for &dst in self.destinations(port) {
                        if seen.insert(dst) {
                            out.push((dst, value));
                            pending.push(dst);
                        }
                    }
                }
            }
        }
    }
}
