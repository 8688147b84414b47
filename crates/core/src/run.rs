// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier and state machine: one concrete execution attempt of a Task.

use crate::node::NodeId;
use crate::task::{TaskId, TaskSpec};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a run.
    pub struct RunId("run-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Assigned,
    Running,
    Done,
    Failed,
    Cancelled,
    Timeout,
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Assigned => "assigned",
        Running => "running",
        Done => "done",
        Failed => "failed",
        Cancelled => "cancelled",
        Timeout => "timeout",
    }
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Timeout)
    }
}

/// Immutable frozen copy of a Task's execution inputs at the moment the Run
/// is queued. The Task may change afterwards (new Runs, context updates);
/// the Run always replays against this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub task_spec: TaskSpec,
    pub agent_config: serde_json::Value,
}

/// One concrete execution attempt of a Task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub task_id: TaskId,
    pub status: RunStatus,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    pub snapshot: RunSnapshot,
    #[serde(default)]
    pub started_at_ms: Option<u64>,
    #[serde(default)]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at_ms: u64,
}

/// Errors produced by invalid Run state transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RunTransitionError {
    #[error("run is already terminal ({0})")]
    AlreadyTerminal(RunStatus),
}

impl Run {
    pub fn new(id: RunId, task_id: TaskId, snapshot: RunSnapshot, now_ms: u64) -> Self {
        Self {
            id,
            task_id,
            status: RunStatus::Queued,
            node_id: None,
            snapshot,
            started_at_ms: None,
            finished_at_ms: None,
            error: None,
            created_at_ms: now_ms,
        }
    }

    /// Invariant 1: `node_id` is null iff status = queued.
    pub fn node_id_invariant_holds(&self) -> bool {
        (self.status == RunStatus::Queued) == self.node_id.is_none()
    }

    pub fn assign(&mut self, node_id: NodeId) -> Result<(), RunTransitionError> {
        if self.status.is_terminal() {
            return Err(RunTransitionError::AlreadyTerminal(self.status));
        }
        self.status = RunStatus::Assigned;
        self.node_id = Some(node_id);
        Ok(())
    }

    /// Mark the run running. Idempotent: a re-delivered report does not
    /// reset `started_at_ms`.
    pub fn mark_running(&mut self, now_ms: u64) -> Result<(), RunTransitionError> {
        if self.status.is_terminal() {
            return Err(RunTransitionError::AlreadyTerminal(self.status));
        }
        self.status = RunStatus::Running;
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(now_ms);
        }
        Ok(())
    }

    pub fn finish(
        &mut self,
        status: RunStatus,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), RunTransitionError> {
        if !status.is_terminal() {
            // Caller error, but do not panic in a library: treat as a no-op guard.
            return Ok(());
        }
        if self.status.is_terminal() {
            return Err(RunTransitionError::AlreadyTerminal(self.status));
        }
        self.status = status;
        self.finished_at_ms = Some(now_ms);
        self.error = error;
        Ok(())
    }

    /// Reset an `assigned`/`running`-but-never-started run back to `queued`
    /// (the watchdog in §4.3).
    pub fn reclaim_to_queued(&mut self) -> bool {
        if self.started_at_ms.is_some() || self.status.is_terminal() {
            return false;
        }
        self.status = RunStatus::Queued;
        self.node_id = None;
        true
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        into {
            id: RunId = RunId::from_string("run-test"),
            task_id: TaskId = TaskId::from_string("task-test"),
        }
        set {
            status: RunStatus = RunStatus::Queued,
            node_id: Option<NodeId> = None,
            snapshot: RunSnapshot = RunSnapshot {
                task_spec: crate::task::TaskSpec {
                    prompt: "hello".to_string(),
                    workspace: None,
                    security: crate::task::SecuritySpec::default(),
                    labels: std::collections::HashMap::new(),
                    agent_type: "claude".to_string(),
                },
                agent_config: serde_json::Value::Null,
            },
            started_at_ms: Option<u64> = None,
            finished_at_ms: Option<u64> = None,
            error: Option<String> = None,
            created_at_ms: u64 = 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_is_queued_with_no_node() {
        let run = Run::builder().build();
        assert_eq!(run.status, RunStatus::Queued);
        assert!(run.node_id_invariant_holds());
    }

    #[test]
    fn assign_sets_node_and_status() {
        let mut run = Run::builder().build();
        run.assign(NodeId::from_string("node-1")).unwrap();
        assert_eq!(run.status, RunStatus::Assigned);
        assert!(run.node_id_invariant_holds());
    }

    #[test]
    fn mark_running_sets_started_at_once() {
        let mut run = Run::builder().status(RunStatus::Assigned).build();
        run.mark_running(100).unwrap();
        assert_eq!(run.started_at_ms, Some(100));
        // Idempotent re-delivery does not reset started_at.
        run.mark_running(200).unwrap();
        assert_eq!(run.started_at_ms, Some(100));
    }

    #[test]
    fn finish_rejects_double_terminal() {
        let mut run = Run::builder().status(RunStatus::Running).build();
        run.finish(RunStatus::Done, None, 50).unwrap();
        assert_eq!(run.status, RunStatus::Done);
        assert_eq!(run.finished_at_ms, Some(50));
        let err = run.finish(RunStatus::Failed, None, 60).unwrap_err();
        assert_eq!(err, RunTransitionError::AlreadyTerminal(RunStatus::Done));
    }

    #[test]
    fn reclaim_to_queued_only_when_never_started() {
        let mut run = Run::builder().status(RunStatus::Assigned).build();
        run.node_id = Some(NodeId::from_string("node-1"));
        assert!(run.reclaim_to_queued());
        assert_eq!(run.status, RunStatus::Queued);
        assert!(run.node_id.is_none());

        let mut run2 = Run::builder().status(RunStatus::Running).build();
        run2.started_at_ms = Some(5);
        assert!(!run2.reclaim_to_queued());
    }

    #[test]
    fn assign_rejects_terminal_run() {
        let mut run = Run::builder().status(RunStatus::Done).build();
        assert!(run.assign(NodeId::from_string("node-1")).is_err());
    }
}
