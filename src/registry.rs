//! Part factory registry for configuration-driven designs.
//!
//! Leaf parts in a configuration file are named by type. The registry maps
//! each type name to a factory building the [`Part`] from an instance name
//! and string attributes.
//!
//! # Example
//!
//! ```
//! use kairo::registry::PartRegistry;
//! use kairo::parts;
//! use std::collections::HashMap;
//!
//! let mut registry = PartRegistry::new();
//! registry.register("Register", |name, _attrs| Ok(parts::register(name)));
//!
//! let part = registry.create("Register", "dut", &HashMap::new()).unwrap();
//! assert_eq!(part.class(), "Register");
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{ConfigError, ConfigResult};
use crate::part::Part;
use crate::parts;

/// String attributes of a part declaration.
pub type Attrs = HashMap<String, String>;

/// Builds a part from its instance name and attributes.
pub type PartFactory = Arc<dyn Fn(&str, &Attrs) -> ConfigResult<Part> + Send + Sync>;

/// A registry of part factories keyed by type name.
#[derive(Default, Clone)]
pub struct PartRegistry {
    factories: HashMap<String, PartFactory>,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `type_name`, replacing any previous entry.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &Attrs) -> ConfigResult<Part> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    /// Creates a part instance by type name.
    pub fn create(&self, type_name: &str, name: &str, attrs: &Attrs) -> ConfigResult<Part> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ConfigError::UnknownPartType(type_name.to_string()))?;
        factory(name, attrs)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }
}

impl std::fmt::Debug for PartRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartRegistry")
            .field("registered_types", &self.type_names())
            .finish()
    }
}

/// Parses attribute `key`, falling back to `default` when absent.
pub fn attr<T: FromStr>(attrs: &Attrs, key: &str, default: T) -> ConfigResult<T> {
    match attrs.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("attribute '{}' has invalid value '{}'", key, raw))
        }),
    }
}

/// Creates a registry with the built-in part library.
///
/// Includes:
/// - `Clock`, `FreeRunningClock`
/// - `Source` (attributes `reset_cycles`, `data_period`)
/// - `Register`, `Sink`
/// - `And`, `Or`, `Xor`, `Not`
pub fn create_default_registry() -> PartRegistry {
    let mut registry = PartRegistry::new();

    registry.register("Clock", |name, _| Ok(parts::clock(name)));
    registry.register("FreeRunningClock", |name, _| Ok(parts::free_running_clock(name)));

    registry.register("Source", |name, attrs| {
        let reset_cycles = attr(attrs, "reset_cycles", parts::DEFAULT_RESET_CYCLES)?;
        let data_period = attr(attrs, "data_period", parts::DEFAULT_DATA_PERIOD)?;
        if data_period == 0 {
            return Err(ConfigError::Validation(format!(
                "part '{}': data_period must be positive",
                name
            )));
        }
        Ok(parts::source_with(name, reset_cycles, data_period))
    });

    registry.register("Register", |name, _| Ok(parts::register(name)));
    registry.register("Sink", |name, _| Ok(parts::sink(name)));

    registry.register("And", |name, _| Ok(parts::and_gate(name)));
    registry.register("Or", |name, _| Ok(parts::or_gate(name)));
    registry.register("Xor", |name, _| Ok(parts::xor_gate(name)));
    registry.register("Not", |name, _| Ok(parts::not_gate(name)));

    registry
}
