//! Structural snapshots for diagram tools.
//!
//! A snapshot describes one composite part: its own ports, its direct
//! children with their ports, and the wires between them. Endpoints on the
//! composite's own ports use the composite's identifier as `part_id`.
//!
//! ```json
//! {
//!   "format_version": "1.0",
//!   "part": {
//!     "identifier": "tb",
//!     "class": "Testbench",
//!     "ports": [{ "name": "rst", "direction": "input" }],
//!     "inner_parts": [{ "identifier": "dut", "class": "Register", "ports": [] }],
//!     "connections": [{
//!       "source": { "part_id": "tb", "port_id": "rst" },
//!       "destination": { "part_id": "dut", "port_id": "rst" }
//!     }]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::part::Part;
use crate::port::Direction;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

impl From<Direction> for PinDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => PinDirection::Input,
            Direction::Out => PinDirection::Output,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEntry {
    pub name: String,
    pub direction: PinDirection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerPart {
    pub identifier: String,
    pub class: String,
    pub ports: Vec<PortEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub part_id: String,
    pub port_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub destination: Endpoint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSnapshot {
    pub identifier: String,
    pub class: String,
    pub ports: Vec<PortEntry>,
    pub inner_parts: Vec<InnerPart>,
    pub connections: Vec<Connection>,
}

/// Root document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: String,
    pub part: PartSnapshot,
}

fn port_entries(part: &Part) -> Vec<PortEntry> {
    part.ports_by_direction()
        .map(|p| PortEntry {
            name: p.name.clone(),
            direction: p.direction.into(),
        })
        .collect()
}

fn endpoint(scope: &Part, path: &str) -> SimResult<Endpoint> {
    match path.split_once('.') {
        Some((child, port)) => {
            if !scope.children().iter().any(|c| c.name() == child) {
                return Err(SimError::UnknownPart(format!("{}.{}", scope.name(), child)));
            }
            Ok(Endpoint {
                part_id: child.to_string(),
                port_id: port.to_string(),
            })
        }
        None => Ok(Endpoint {
            part_id: scope.name().to_string(),
            port_id: path.to_string(),
        }),
    }
}

impl Snapshot {
    /// Captures the structure of a composite part. Leaves have no structure
    /// and yield `NotComposite`.
    pub fn capture(part: &Part) -> SimResult<Self> {
        if part.is_leaf() {
            return Err(SimError::NotComposite(part.name().to_string()));
        }

        let inner_parts = part
            .children()
            .iter()
            .map(|child| InnerPart {
                identifier: child.name().to_string(),
                class: child.class().to_string(),
                ports: port_entries(child),
            })
            .collect();

        let connections = part
            .wires()
            .iter()
            .map(|w| {
                Ok(Connection {
                    source: endpoint(part, &w.from)?,
                    destination: endpoint(part, &w.to)?,
                })
            })
            .collect::<SimResult<Vec<_>>>()?;

        Ok(Self {
            format_version: FORMAT_VERSION.to_string(),
            part: PartSnapshot {
                identifier: part.name().to_string(),
                class: part.class().to_string(),
                ports: port_entries(part),
                inner_parts,
                connections,
            },
        })
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
