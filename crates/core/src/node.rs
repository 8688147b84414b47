// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered worker node.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a registered node.
    pub struct NodeId("node-");
}

/// Administrative/observed status of a [`Node`].
///
/// This is distinct from the coordination-bus liveness lease: an operator
/// may hold a node at `draining` or `maintenance` regardless of whether its
/// heartbeat is still arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Online,
    Offline,
    Draining,
    Maintenance,
    Terminated,
    Starting,
    Unhealthy,
}

crate::simple_display! {
    NodeStatus {
        Online => "online",
        Offline => "offline",
        Draining => "draining",
        Maintenance => "maintenance",
        Terminated => "terminated",
        Starting => "starting",
        Unhealthy => "unhealthy",
    }
}

impl NodeStatus {
    /// Administrative states that must not be clobbered by a heartbeat upsert.
    pub fn is_administrative(self) -> bool {
        matches!(self, NodeStatus::Draining | NodeStatus::Maintenance | NodeStatus::Terminated)
    }
}

/// A worker host registered with the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub hostname: String,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub capacity: HashMap<String, i64>,
    pub status: NodeStatus,
    pub last_heartbeat_at_ms: u64,
    pub created_at_ms: u64,
}

impl Node {
    /// True if every entry in `required` is present with a matching value in `self.labels`.
    ///
    /// This is the entirety of the assignment policy: label-match-only, no
    /// capacity scoring or bin-packing.
    pub fn satisfies_labels(&self, required: &HashMap<String, String>) -> bool {
        required.iter().all(|(k, v)| self.labels.get(k) == Some(v))
    }
}

crate::builder! {
    pub struct NodeBuilder => Node {
        into {
            id: NodeId = NodeId::from_string("node-test"),
            hostname: String = "test-host",
        }
        set {
            ips: Vec<String> = Vec::new(),
            labels: HashMap<String, String> = HashMap::new(),
            capacity: HashMap<String, i64> = HashMap::new(),
            status: NodeStatus = NodeStatus::Online,
            last_heartbeat_at_ms: u64 = 0,
            created_at_ms: u64 = 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_labels_requires_all_present() {
        let node = Node::builder()
            .labels(HashMap::from([
                ("gpu".to_string(), "true".to_string()),
                ("region".to_string(), "us".to_string()),
            ]))
            .build();
        let mut req = HashMap::new();
        req.insert("gpu".to_string(), "true".to_string());
        assert!(node.satisfies_labels(&req));
        req.insert("region".to_string(), "eu".to_string());
        assert!(!node.satisfies_labels(&req));
    }

    #[test]
    fn satisfies_labels_empty_requirement_always_matches() {
        let node = Node::builder().build();
        assert!(node.satisfies_labels(&HashMap::new()));
    }

    #[test]
    fn administrative_states() {
        assert!(NodeStatus::Draining.is_administrative());
        assert!(NodeStatus::Maintenance.is_administrative());
        assert!(NodeStatus::Terminated.is_administrative());
        assert!(!NodeStatus::Online.is_administrative());
        assert!(!NodeStatus::Unhealthy.is_administrative());
    }
}
