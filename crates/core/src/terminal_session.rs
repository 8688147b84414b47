// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TerminalSession: interactive tty-over-web session bound to an Instance.
//!
//! At most one session may be `running` per Instance at a time: opening a
//! new session closes the previous one within the next poll tick (§8 seed
//! scenario 6). This module models the lifecycle of a single session once
//! it exists; the one-active-per-instance rule is enforced by the store.

use crate::instance::InstanceId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a terminal session.
    pub struct TerminalSessionId("term-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalSessionStatus {
    Pending,
    Starting,
    Running,
    Closed,
    Error,
}

crate::simple_display! {
    TerminalSessionStatus {
        Pending => "pending",
        Starting => "starting",
        Running => "running",
        Closed => "closed",
        Error => "error",
    }
}

impl TerminalSessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TerminalSessionStatus::Closed | TerminalSessionStatus::Error)
    }
}

/// One interactive tty-over-web attach to a running Instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSession {
    pub id: TerminalSessionId,
    pub instance_id: InstanceId,
    pub container_name: String,
    pub node_id: NodeId,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub url: Option<String>,
    pub status: TerminalSessionStatus,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    #[serde(default)]
    pub closed_at_ms: Option<u64>,
}

impl TerminalSession {
    pub fn new(
        id: TerminalSessionId,
        instance_id: InstanceId,
        container_name: String,
        node_id: NodeId,
        now_ms: u64,
        ttl_ms: u64,
    ) -> Self {
        Self {
            id,
            instance_id,
            container_name,
            node_id,
            port: None,
            url: None,
            status: TerminalSessionStatus::Pending,
            created_at_ms: now_ms,
            expires_at_ms: now_ms + ttl_ms,
            closed_at_ms: None,
        }
    }

    pub fn mark_running(&mut self, port: u16, url: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.port = Some(port);
        self.url = Some(url);
        self.status = TerminalSessionStatus::Running;
        true
    }

    /// Close this session to make way for a newly opened one on the same
    /// Instance (exclusivity enforcement).
    pub fn close(&mut self, now_ms: u64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TerminalSessionStatus::Closed;
        self.closed_at_ms = Some(now_ms);
        true
    }
}

crate::builder! {
    pub struct TerminalSessionBuilder => TerminalSession {
        into {
            id: TerminalSessionId = TerminalSessionId::from_string("term-test"),
            instance_id: InstanceId = crate::instance::InstanceId::from_string("inst-test"),
            container_name: String = "fleet-inst-test".to_string(),
            node_id: NodeId = crate::node::NodeId::from_string("node-test"),
        }
        set {
            port: Option<u16> = None,
            url: Option<String> = None,
            status: TerminalSessionStatus = TerminalSessionStatus::Pending,
            created_at_ms: u64 = 0,
            expires_at_ms: u64 = 0,
            closed_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent() {
        let mut s = TerminalSession::builder().status(TerminalSessionStatus::Running).build();
        assert!(s.close(10));
        assert_eq!(s.closed_at_ms, Some(10));
        assert!(!s.close(20));
        assert_eq!(s.closed_at_ms, Some(10));
    }

    #[test]
    fn mark_running_sets_port_and_url() {
        let mut s = TerminalSession::builder().build();
        assert!(s.mark_running(7681, "http://node-1:7681/".into()));
        assert_eq!(s.status, TerminalSessionStatus::Running);
        assert_eq!(s.port, Some(7681));
    }

    #[test]
    fn mark_running_rejected_once_closed() {
        let mut s = TerminalSession::builder().status(TerminalSessionStatus::Closed).build();
        assert!(!s.mark_running(7681, "http://node-1:7681/".into()));
    }
}
