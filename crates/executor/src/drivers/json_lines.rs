// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference driver (§4.9): the agent CLI is assumed to emit one JSON object
//! per line of the shape `{"type": "...", ...}` on stdout. Sufficient to
//! exercise the executor end-to-end; concrete Claude/Gemini/Qwen transcript
//! parsers are out of scope here.

use fleet_core::TaskSpec;

use crate::drivers::{AgentDriver, ParsedEvent};
use crate::error::DriverError;

pub struct JsonLinesDriver {
    name: String,
}

impl JsonLinesDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AgentDriver for JsonLinesDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, spec: &TaskSpec) -> Result<(), DriverError> {
        if spec.prompt.trim().is_empty() {
            return Err(DriverError::InvalidSpec("prompt must not be empty".into()));
        }
        Ok(())
    }

    fn build_command(&self, spec: &TaskSpec, agent_config: &serde_json::Value) -> String {
        let mut cmd = format!("{} --print --output-format stream-json", self.name);
        if let Some(model) = agent_config.get("model").and_then(|v| v.as_str()) {
            cmd.push_str(&format!(" --model {model}"));
        }
        cmd.push_str(&format!(" {}", shell_quote(&spec.prompt)));
        cmd
    }

    fn parse_event(&self, line: &str) -> Option<ParsedEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        let event_type = value.get("type")?.as_str()?.to_string();
        Some(ParsedEvent { event_type, payload: value })
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_json_line() {
        let driver = JsonLinesDriver::new("claude-v1");
        let event = driver.parse_event(r#"{"type":"tool_use","name":"bash"}"#).unwrap();
        assert_eq!(event.event_type, "tool_use");
    }

    #[test]
    fn ignores_non_json_noise_lines() {
        let driver = JsonLinesDriver::new("claude-v1");
        assert!(driver.parse_event("Connecting to model...").is_none());
        assert!(driver.parse_event("").is_none());
    }

    #[test]
    fn build_command_includes_model_override() {
        let driver = JsonLinesDriver::new("claude-v1");
        let spec = TaskSpec {
            prompt: "fix the bug".into(),
            workspace: None,
            security: Default::default(),
            labels: Default::default(),
            agent_type: "claude-v1".into(),
        };
        let cmd = driver.build_command(&spec, &serde_json::json!({"model": "opus"}));
        assert!(cmd.contains("--model opus"));
        assert!(cmd.contains("'fix the bug'"));
    }
}
