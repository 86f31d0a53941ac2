//! Values carried by ports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::logic::Logic;

/// The declared type of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Logic,
    Bool,
    Int,
    Real,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Logic => "logic",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Real => "real",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "logic" | "std_logic" => Ok(ValueType::Logic),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "int" | "integer" => Ok(ValueType::Int),
            "real" | "float" => Ok(ValueType::Real),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

/// A value held by a port.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Logic(Logic),
    Bool(bool),
    Int(i64),
    Real(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Logic(_) => ValueType::Logic,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Real(_) => ValueType::Real,
        }
    }

    /// Logic view of the value. Booleans map to `0`/`1`.
    pub fn as_logic(&self) -> Option<Logic> {
        match *self {
            Value::Logic(l) => Some(l),
            Value::Bool(b) => Some(Logic::from(b)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match *self {
            Value::Real(r) => Some(r),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl From<Logic> for Value {
    fn from(value: Logic) -> Self {
        Value::Logic(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Logic(l) => write!(f, "'{}'", l),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
        }
    }
}
