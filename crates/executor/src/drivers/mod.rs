// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver registry (§4.9): the capability trait agent-family adapters
//! implement, plus a process-local lookup table keyed on the normalised
//! driver name the control plane already wrote into `TaskSpec.agent_type`.

mod json_lines;
mod raw;

pub use json_lines::JsonLinesDriver;
pub use raw::RawPassthroughDriver;

use std::collections::HashMap;

use fleet_core::TaskSpec;

use crate::error::DriverError;

/// One canonical event parsed from a line of driver output, ready to be
/// wrapped into a `RunEvent` and appended to the Run's event log (§4.5).
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Capability trait for a concrete agent family's CLI invocation and output
/// parsing. Registered by name in a `DriverRegistry` at start-up.
pub trait AgentDriver: Send + Sync {
    /// The normalised driver name this instance answers to (e.g. `"claude-v1"`).
    fn name(&self) -> &str;

    /// Reject task specs this driver cannot execute (missing prompt, etc).
    fn validate(&self, spec: &TaskSpec) -> Result<(), DriverError>;

    /// Build the shell command to run inside the target container.
    fn build_command(&self, spec: &TaskSpec, agent_config: &serde_json::Value) -> String;

    /// Parse one line of the driver's stdout into a canonical event, if the
    /// line carries one. Lines the driver doesn't recognise return `None`.
    fn parse_event(&self, line: &str) -> Option<ParsedEvent>;

    /// Collect any artifacts the driver produced beyond the event stream.
    /// The reference drivers shipped here have none.
    fn collect_artifacts(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Process-local lookup table from normalised driver name to implementation.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Box<dyn AgentDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, driver: Box<dyn AgentDriver>) {
        self.drivers.insert(driver.name().to_string(), driver);
    }

    pub fn get(&self, name: &str) -> Result<&dyn AgentDriver, DriverError> {
        self.drivers.get(name).map(|d| d.as_ref()).ok_or_else(|| DriverError::Unknown(name.to_string()))
    }

    /// The registry this spec ships: one reference JSON-events driver per
    /// normalised family, plus the raw passthrough fallback (§4.9).
    pub fn with_reference_drivers() -> Self {
        let mut registry = Self::new();
        for name in ["claude-v1", "gemini-v1", "qwencode-v1"] {
            registry.register(Box::new(JsonLinesDriver::new(name)));
        }
        registry.register(Box::new(RawPassthroughDriver));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_driver_name_is_an_error() {
        let registry = DriverRegistry::new();
        let err = registry.get("nonexistent-v1").unwrap_err();
        assert!(matches!(err, DriverError::Unknown(name) if name == "nonexistent-v1"));
    }

    #[test]
    fn reference_registry_resolves_known_families() {
        let registry = DriverRegistry::with_reference_drivers();
        assert!(registry.get("claude-v1").is_ok());
        assert!(registry.get("raw").is_ok());
    }
}
