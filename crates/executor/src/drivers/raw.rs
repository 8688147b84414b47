// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback driver for agent types with no structured-event parser: every
//! line of stdout becomes an `output` event carrying the raw text (§4.9).

use fleet_core::TaskSpec;

use crate::drivers::{AgentDriver, ParsedEvent};
use crate::error::DriverError;

pub struct RawPassthroughDriver;

impl AgentDriver for RawPassthroughDriver {
    fn name(&self) -> &str {
        "raw"
    }

    fn validate(&self, spec: &TaskSpec) -> Result<(), DriverError> {
        if spec.prompt.trim().is_empty() {
            return Err(DriverError::InvalidSpec("prompt must not be empty".into()));
        }
        Ok(())
    }

    fn build_command(&self, spec: &TaskSpec, _agent_config: &serde_json::Value) -> String {
        format!("{} {}", spec.agent_type, spec.prompt)
    }

    fn parse_event(&self, line: &str) -> Option<ParsedEvent> {
        if line.is_empty() {
            return None;
        }
        Some(ParsedEvent { event_type: "output".to_string(), payload: serde_json::json!({ "line": line }) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_nonempty_line_becomes_an_output_event() {
        let driver = RawPassthroughDriver;
        let event = driver.parse_event("hello world").unwrap();
        assert_eq!(event.event_type, "output");
        assert_eq!(event.payload["line"], "hello world");
    }
}
