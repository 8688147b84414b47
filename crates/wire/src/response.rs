// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies returned by the control-plane HTTP surface (§6).

use fleet_core::{
    Action, AccountId, ActionId, NodeId, Operation, OperationId, OperationStatus, Run, RunId, Task,
};
use serde::{Deserialize, Serialize};

/// `{"error": "<message>"}` — the single error-body shape for the whole API.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTreeResponse {
    pub task: Task,
    pub children: Vec<TaskTreeResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub run: Run,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteTaskResponse {
    pub run_id: RunId,
    pub status: fleet_core::RunStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsCountResponse {
    pub run_id: RunId,
    pub count: u64,
}

/// Synchronous response for `POST /operations` when `type = "api_key"`
/// (§6, seed scenario 2) — everything settles within the one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationCreateResponse {
    pub operation_id: OperationId,
    pub action_id: ActionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    pub status: OperationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDetailResponse {
    #[serde(flatten)]
    pub operation: Operation,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDetailResponse {
    #[serde(flatten)]
    pub action: Action,
    pub operation: Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHeartbeatResponse {
    pub node_id: NodeId,
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyTestResponse {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}
