// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier and state machine.
//!
//! A Task is user intent; it is mutated only by the terminal status of its
//! Runs (see [`crate::run`]) and by explicit context replacement, never
//! directly by a client setting an arbitrary status.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a task.
    pub struct TaskId("task-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// Security posture requested for the container a Run executes in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySpec {
    #[serde(default)]
    pub network_isolated: bool,
    #[serde(default)]
    pub read_only_root: bool,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

/// Free-form intent: what to run, where, and which node labels qualify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub prompt: String,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub security: SecuritySpec,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Normalised driver name the executor should dispatch to (e.g. `claude-v1`).
    pub agent_type: String,
}

/// A single piece of context inherited or produced by a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub key: String,
    pub value: serde_json::Value,
}

/// Hierarchical context: what this task inherited from its parent (copied by
/// value at creation time, never by reference — see §9 Cyclic references),
/// plus what this task itself produced, plus a flat conversation history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(default)]
    pub inherited: Vec<ContextItem>,
    #[serde(default)]
    pub produced: Vec<ContextItem>,
    #[serde(default)]
    pub conversation: Vec<String>,
}

impl TaskContext {
    /// Build the context a child task inherits from a parent: the parent's
    /// produced items become the child's inherited items, by value.
    pub fn inherit_from(parent: &TaskContext) -> Self {
        Self { inherited: parent.produced.clone(), produced: Vec::new(), conversation: Vec::new() }
    }
}

/// A Task: user intent, possibly part of a parent/child forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    pub name: String,
    pub status: TaskStatus,
    pub spec: TaskSpec,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub context: Option<TaskContext>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Task {
    /// Apply the terminal status of a finished Run to this task (invariant 6).
    ///
    /// Returns `true` if the status actually changed.
    pub fn apply_run_terminal(&mut self, run_status: crate::run::RunStatus, now_ms: u64) -> bool {
        use crate::run::RunStatus;
        let new_status = match run_status {
            RunStatus::Done => TaskStatus::Completed,
            RunStatus::Failed | RunStatus::Timeout => TaskStatus::Failed,
            RunStatus::Cancelled => TaskStatus::Cancelled,
            RunStatus::Queued | RunStatus::Assigned | RunStatus::Running => return false,
        };
        if self.status == new_status {
            return false;
        }
        self.status = new_status;
        self.updated_at_ms = now_ms;
        true
    }

    /// Mark the task `in_progress` the first time a Run starts running.
    pub fn mark_in_progress(&mut self, now_ms: u64) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::InProgress;
        self.updated_at_ms = now_ms;
        true
    }
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            id: TaskId = TaskId::from_string("task-test"),
            name: String = "test-task",
        }
        set {
            parent_id: Option<TaskId> = None,
            status: TaskStatus = TaskStatus::Pending,
            spec: TaskSpec = TaskSpec {
                prompt: "hello".to_string(),
                workspace: None,
                security: SecuritySpec::default(),
                labels: HashMap::new(),
                agent_type: "claude".to_string(),
            },
            context: Option<TaskContext> = None,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            template_id: String = None,
            agent_id: String = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStatus;

    #[test]
    fn mark_in_progress_only_from_pending() {
        let mut t = Task::builder().build();
        assert!(t.mark_in_progress(10));
        assert_eq!(t.status, TaskStatus::InProgress);
        assert!(!t.mark_in_progress(20));
        assert_eq!(t.updated_at_ms, 10);
    }

    #[test]
    fn apply_run_terminal_maps_done_to_completed() {
        let mut t = Task::builder().status(TaskStatus::InProgress).build();
        assert!(t.apply_run_terminal(RunStatus::Done, 5));
        assert_eq!(t.status, TaskStatus::Completed);
    }

    #[test]
    fn apply_run_terminal_maps_failed_and_timeout_to_failed() {
        for s in [RunStatus::Failed, RunStatus::Timeout] {
            let mut t = Task::builder().status(TaskStatus::InProgress).build();
            assert!(t.apply_run_terminal(s, 5));
            assert_eq!(t.status, TaskStatus::Failed);
        }
    }

    #[test]
    fn apply_run_terminal_ignores_non_terminal_run_status() {
        let mut t = Task::builder().status(TaskStatus::InProgress).build();
        assert!(!t.apply_run_terminal(RunStatus::Running, 5));
        assert_eq!(t.status, TaskStatus::InProgress);
    }

    #[test]
    fn apply_run_terminal_is_idempotent() {
        let mut t = Task::builder().status(TaskStatus::InProgress).build();
        assert!(t.apply_run_terminal(RunStatus::Done, 5));
        assert!(!t.apply_run_terminal(RunStatus::Done, 10));
        assert_eq!(t.updated_at_ms, 5);
    }

    #[test]
    fn context_inherit_from_copies_produced_into_inherited_by_value() {
        let mut parent = TaskContext::default();
        parent.produced.push(ContextItem { key: "repo".into(), value: "acme/widgets".into() });
        let child = TaskContext::inherit_from(&parent);
        assert_eq!(child.inherited.len(), 1);
        assert!(child.produced.is_empty());
        // Mutating the parent afterwards must not affect the already-copied child.
        parent.produced.push(ContextItem { key: "branch".into(), value: "main".into() });
        assert_eq!(child.inherited.len(), 1);
    }
}
