// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request bodies accepted by the control-plane HTTP surface (§6).

use fleet_core::{NodeId, OperationType, SecuritySpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub security: SecuritySpec,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub agent_type: String,
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceContextRequest {
    #[serde(default)]
    pub inherited: Vec<fleet_core::ContextItem>,
    #[serde(default)]
    pub produced: Vec<fleet_core::ContextItem>,
    #[serde(default)]
    pub conversation: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteTaskRequest {
    /// Optional override of the Task's `agent_config`; merged over defaults.
    #[serde(default)]
    pub agent_config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperationRequest {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    #[serde(default)]
    pub config: serde_json::Value,
    pub node_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchActionRequest {
    pub status: fleet_core::ActionStatus,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRunRequest {
    pub status: fleet_core::RunStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHeartbeatRequest {
    pub node_id: NodeId,
    pub hostname: String,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub capacity: HashMap<String, i64>,
}

/// One event as submitted by the executor in a batch (§6, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWire {
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: u64,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEventsRequest {
    pub events: Vec<EventWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProxyRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyTestRequest {
    #[serde(default)]
    pub target_url: Option<String>,
}
