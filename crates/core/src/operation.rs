// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation: one side-effecting procedure targeted at a specific node.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an operation.
    pub struct OperationId("op-");
}

/// Kind of side-effecting procedure an Operation performs.
///
/// `ApiKey` is the one synchronous kind (§4.4): it completes at creation
/// time with no node dispatch. Everything else is asynchronous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Oauth,
    DeviceCode,
    ApiKey,
    RuntimeCreate,
    Custom(String),
}

impl OperationType {
    pub fn is_synchronous(&self) -> bool {
        matches!(self, OperationType::ApiKey)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Oauth => "oauth",
            OperationType::DeviceCode => "device_code",
            OperationType::ApiKey => "api_key",
            OperationType::RuntimeCreate => "runtime_create",
            OperationType::Custom(s) => s.as_str(),
        }
    }
}

impl From<&str> for OperationType {
    fn from(s: &str) -> Self {
        match s {
            "oauth" => OperationType::Oauth,
            "device_code" => OperationType::DeviceCode,
            "api_key" => OperationType::ApiKey,
            "runtime_create" => OperationType::RuntimeCreate,
            other => OperationType::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    OperationStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed | OperationStatus::Cancelled)
    }

    /// Map an Action's terminal status onto the owning Operation's terminal
    /// status (invariant 5): success -> completed, anything else -> failed.
    pub fn from_action_terminal(action_status: crate::action::ActionStatus) -> Option<Self> {
        use crate::action::ActionStatus;
        match action_status {
            ActionStatus::Success => Some(OperationStatus::Completed),
            ActionStatus::Failed | ActionStatus::Timeout | ActionStatus::Cancelled => {
                Some(OperationStatus::Failed)
            }
            ActionStatus::Assigned | ActionStatus::Running | ActionStatus::Waiting => None,
        }
    }
}

/// One side-effecting procedure targeted at a specific node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub config: serde_json::Value,
    pub node_id: NodeId,
    pub status: OperationStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default)]
    pub finished_at_ms: Option<u64>,
}

impl Operation {
    pub fn new(id: OperationId, operation_type: OperationType, config: serde_json::Value, node_id: NodeId, now_ms: u64) -> Self {
        Self {
            id,
            operation_type,
            config,
            node_id,
            status: OperationStatus::Pending,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            finished_at_ms: None,
        }
    }

    /// Bump `pending -> in_progress` the first time an Action starts running.
    pub fn bump_in_progress(&mut self, now_ms: u64) {
        if self.status == OperationStatus::Pending {
            self.status = OperationStatus::InProgress;
            self.updated_at_ms = now_ms;
        }
    }

    pub fn apply_terminal(&mut self, status: OperationStatus, now_ms: u64) {
        self.status = status;
        self.updated_at_ms = now_ms;
        self.finished_at_ms = Some(now_ms);
    }
}

crate::builder! {
    pub struct OperationBuilder => Operation {
        into {
            id: OperationId = OperationId::from_string("op-test"),
            node_id: NodeId = crate::node::NodeId::from_string("node-test"),
        }
        set {
            operation_type: OperationType = OperationType::Oauth,
            config: serde_json::Value = serde_json::json!({}),
            status: OperationStatus = OperationStatus::Pending,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
            finished_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionStatus;

    #[test]
    fn api_key_is_synchronous_others_are_not() {
        assert!(OperationType::ApiKey.is_synchronous());
        assert!(!OperationType::Oauth.is_synchronous());
        assert!(!OperationType::RuntimeCreate.is_synchronous());
    }

    #[test]
    fn bump_in_progress_only_from_pending() {
        let mut op = Operation::builder().build();
        op.bump_in_progress(5);
        assert_eq!(op.status, OperationStatus::InProgress);
        op.status = OperationStatus::Completed;
        op.bump_in_progress(10);
        assert_eq!(op.status, OperationStatus::Completed);
    }

    #[test]
    fn action_terminal_maps_to_operation_terminal() {
        assert_eq!(
            OperationStatus::from_action_terminal(ActionStatus::Success),
            Some(OperationStatus::Completed)
        );
        for s in [ActionStatus::Failed, ActionStatus::Timeout, ActionStatus::Cancelled] {
            assert_eq!(OperationStatus::from_action_terminal(s), Some(OperationStatus::Failed));
        }
        assert_eq!(OperationStatus::from_action_terminal(ActionStatus::Running), None);
    }

    #[test]
    fn operation_type_round_trips_through_str() {
        for (s, expected) in [
            ("oauth", OperationType::Oauth),
            ("device_code", OperationType::DeviceCode),
            ("api_key", OperationType::ApiKey),
            ("runtime_create", OperationType::RuntimeCreate),
        ] {
            assert_eq!(OperationType::from(s), expected);
            assert_eq!(expected.as_str(), s);
        }
    }
}
