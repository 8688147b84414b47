// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance: a long-lived container running an agent bound to an Account.

use crate::account::AccountId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a runtime instance.
    pub struct InstanceId("inst-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Pending,
    Creating,
    Running,
    Stopping,
    Stopped,
    Error,
}

crate::simple_display! {
    InstanceStatus {
        Pending => "pending",
        Creating => "creating",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Error => "error",
    }
}

impl InstanceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, InstanceStatus::Stopped | InstanceStatus::Error)
    }
}

/// A long-lived container running an agent bound to an Account (concretely,
/// a Docker container per §4.6's Docker-only runtime).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    pub account_id: AccountId,
    pub agent_type: String,
    pub container_name: String,
    pub node_id: NodeId,
    pub status: InstanceStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default)]
    pub stopped_at_ms: Option<u64>,
}

impl Instance {
    pub fn new(
        id: InstanceId,
        name: String,
        account_id: AccountId,
        agent_type: String,
        node_id: NodeId,
        now_ms: u64,
    ) -> Self {
        let container_name = format!("fleet-inst-{}", id.suffix());
        Self {
            id,
            name,
            account_id,
            agent_type,
            container_name,
            node_id,
            status: InstanceStatus::Pending,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            stopped_at_ms: None,
        }
    }

    pub fn mark_running(&mut self, now_ms: u64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = InstanceStatus::Running;
        self.updated_at_ms = now_ms;
        true
    }

    pub fn terminate(&mut self, status: InstanceStatus, now_ms: u64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.updated_at_ms = now_ms;
        self.stopped_at_ms = Some(now_ms);
        true
    }
}

crate::builder! {
    pub struct InstanceBuilder => Instance {
        into {
            id: InstanceId = InstanceId::from_string("inst-test"),
            name: String = "test-instance".to_string(),
            account_id: AccountId = crate::account::AccountId::from_parts("claude", "dev@example.com"),
            agent_type: String = "claude".to_string(),
            container_name: String = "fleet-inst-test".to_string(),
            node_id: NodeId = crate::node::NodeId::from_string("node-test"),
        }
        set {
            status: InstanceStatus = InstanceStatus::Pending,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
            stopped_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_running_then_terminate() {
        let mut inst = Instance::builder().build();
        assert!(inst.mark_running(5));
        assert_eq!(inst.status, InstanceStatus::Running);
        assert!(inst.terminate(InstanceStatus::Stopped, 10));
        assert_eq!(inst.stopped_at_ms, Some(10));
    }

    #[test]
    fn terminate_is_not_idempotent_past_terminal() {
        let mut inst = Instance::builder().status(InstanceStatus::Error).build();
        assert!(!inst.terminate(InstanceStatus::Stopped, 10));
        assert!(!inst.mark_running(20));
    }
}
