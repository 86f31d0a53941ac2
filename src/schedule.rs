//! Scheduling predicates and execution strategies.
//!
//! A [`Schedule`] decides, each step, whether a part is eligible to run. It is
//! declared with port names and resolved to port indices when the design is
//! elaborated, so a reference to a missing port fails before simulation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SimError, SimResult};
use crate::port::Port;

/// Eligibility predicate over a part's own ports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Eligible every step.
    #[default]
    Always,
    /// Eligible when every named port was updated this step.
    AllUpdated(Vec<String>),
    /// Eligible when at least one named port was updated this step.
    AnyUpdated(Vec<String>),
}

impl Schedule {
    /// Sensitivity-list style predicate: fire only when all watched ports changed.
    pub fn all_updated<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schedule::AllUpdated(ports.into_iter().map(Into::into).collect())
    }

    pub fn any_updated<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schedule::AnyUpdated(ports.into_iter().map(Into::into).collect())
    }

    /// Port names referenced by the predicate.
    pub fn watched(&self) -> &[String] {
        match self {
            Schedule::Always => &[],
            Schedule::AllUpdated(names) | Schedule::AnyUpdated(names) => names,
        }
    }

    pub(crate) fn resolve(
        &self,
        part: &str,
        index: &HashMap<String, usize>,
    ) -> SimResult<ResolvedSchedule> {
        let lookup = |names: &[String]| -> SimResult<Vec<usize>> {
            names
                .iter()
                .map(|name| {
                    index.get(name).copied().ok_or_else(|| SimError::Scheduling {
                        part: part.to_string(),
                        port: name.clone(),
                    })
                })
                .collect()
        };

        Ok(match self {
            Schedule::Always => ResolvedSchedule::Always,
            Schedule::AllUpdated(names) => ResolvedSchedule::AllUpdated(lookup(names)?),
            Schedule::AnyUpdated(names) => ResolvedSchedule::AnyUpdated(lookup(names)?),
        })
    }
}

/// A [`Schedule`] bound to port indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ResolvedSchedule {
    Always,
    AllUpdated(Vec<usize>),
    AnyUpdated(Vec<usize>),
}

impl ResolvedSchedule {
    pub(crate) fn is_ready(&self, ports: &[Port]) -> bool {
        match self {
            ResolvedSchedule::Always => true,
            ResolvedSchedule::AllUpdated(idx) => idx.iter().all(|&i| ports[i].is_updated()),
            ResolvedSchedule::AnyUpdated(idx) => idx.iter().any(|&i| ports[i].is_updated()),
        }
    }
}

/// How a composite part runs its children within a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// Children run one after another in declaration order.
    #[default]
    Sequential,
    /// Children may run in parallel; they never share a written port.
    Concurrent,
}
