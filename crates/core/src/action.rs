// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action: one node-side step of an Operation's execution.

use crate::operation::OperationId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an action.
    pub struct ActionId("act-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Assigned,
    Running,
    Waiting,
    Success,
    Failed,
    Timeout,
    Cancelled,
}

crate::simple_display! {
    ActionStatus {
        Assigned => "assigned",
        Running => "running",
        Waiting => "waiting",
        Success => "success",
        Failed => "failed",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Success | ActionStatus::Failed | ActionStatus::Timeout | ActionStatus::Cancelled)
    }
}

/// Errors produced by invalid Action state transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActionTransitionError {
    #[error("action is already terminal ({0})")]
    AlreadyTerminal(ActionStatus),
}

/// One node-side step of an Operation's execution, reported by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub operation_id: OperationId,
    pub status: ActionStatus,
    /// Free-form sub-state within a status (e.g. `"pulling_image"`), opaque
    /// to the control plane.
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// 0-100, monotonic within one Action's lifetime.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub started_at_ms: Option<u64>,
    pub updated_at_ms: u64,
    #[serde(default)]
    pub finished_at_ms: Option<u64>,
}

impl Action {
    pub fn new(id: ActionId, operation_id: OperationId, now_ms: u64) -> Self {
        Self {
            id,
            operation_id,
            status: ActionStatus::Assigned,
            phase: None,
            message: None,
            progress: 0,
            result: serde_json::Value::Null,
            error: None,
            created_at_ms: now_ms,
            started_at_ms: None,
            updated_at_ms: now_ms,
            finished_at_ms: None,
        }
    }

    /// Apply a non-terminal status report (running/waiting), updating phase,
    /// message, and progress. Rejects mutation once terminal.
    pub fn report_progress(
        &mut self,
        status: ActionStatus,
        phase: Option<String>,
        message: Option<String>,
        progress: u8,
        now_ms: u64,
    ) -> Result<(), ActionTransitionError> {
        if self.status.is_terminal() {
            return Err(ActionTransitionError::AlreadyTerminal(self.status));
        }
        if status == ActionStatus::Running && self.started_at_ms.is_none() {
            self.started_at_ms = Some(now_ms);
        }
        self.status = status;
        if phase.is_some() {
            self.phase = phase;
        }
        if message.is_some() {
            self.message = message;
        }
        self.progress = self.progress.max(progress);
        self.updated_at_ms = now_ms;
        Ok(())
    }

    pub fn finish(
        &mut self,
        status: ActionStatus,
        result: serde_json::Value,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), ActionTransitionError> {
        if self.status.is_terminal() {
            return Err(ActionTransitionError::AlreadyTerminal(self.status));
        }
        self.status = status;
        self.result = result;
        self.error = error;
        self.updated_at_ms = now_ms;
        self.finished_at_ms = Some(now_ms);
        if status.is_terminal() {
            self.progress = 100;
        }
        Ok(())
    }
}

crate::builder! {
    pub struct ActionBuilder => Action {
        into {
            id: ActionId = ActionId::from_string("act-test"),
            operation_id: OperationId = OperationId::from_string("op-test"),
        }
        set {
            status: ActionStatus = ActionStatus::Assigned,
            phase: Option<String> = None,
            message: Option<String> = None,
            progress: u8 = 0,
            result: serde_json::Value = serde_json::Value::Null,
            error: Option<String> = None,
            created_at_ms: u64 = 0,
            started_at_ms: Option<u64> = None,
            updated_at_ms: u64 = 0,
            finished_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_progress_clamps_monotonic() {
        let mut a = Action::builder().build();
        a.report_progress(ActionStatus::Running, None, Some("starting".into()), 10, 5).unwrap();
        assert_eq!(a.progress, 10);
        assert_eq!(a.started_at_ms, Some(5));
        a.report_progress(ActionStatus::Running, None, None, 3, 6).unwrap();
        assert_eq!(a.progress, 10, "progress must not regress");
        assert_eq!(a.started_at_ms, Some(5), "started_at must not reset on redelivery");
        assert_eq!(a.message.as_deref(), Some("starting"));
    }

    #[test]
    fn finish_sets_progress_full_on_terminal() {
        let mut a = Action::builder().status(ActionStatus::Running).build();
        a.finish(ActionStatus::Success, serde_json::json!({"ok": true}), None, 20).unwrap();
        assert_eq!(a.status, ActionStatus::Success);
        assert_eq!(a.progress, 100);
        assert_eq!(a.finished_at_ms, Some(20));
    }

    #[test]
    fn mutation_after_terminal_is_rejected() {
        let mut a = Action::builder().status(ActionStatus::Success).build();
        let err = a.report_progress(ActionStatus::Running, None, None, 50, 30).unwrap_err();
        assert_eq!(err, ActionTransitionError::AlreadyTerminal(ActionStatus::Success));
        let err2 = a.finish(ActionStatus::Failed, serde_json::Value::Null, None, 30).unwrap_err();
        assert_eq!(err2, ActionTransitionError::AlreadyTerminal(ActionStatus::Success));
    }
}
