// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{Run, RunEvent, RunId, RunStatus, TaskId};

pub(super) fn apply_put(state: &mut MaterializedState, run: &Run) {
    state.runs.insert(run.id.clone(), run.clone());
}

pub(super) fn apply_events_appended(state: &mut MaterializedState, run_id: &str, events: &[RunEvent]) {
    let id = RunId::from_string(run_id);
    let log = state.run_events.entry(id).or_default();
    for event in events {
        if !log.iter().any(|existing| existing.seq == event.seq) {
            log.push(event.clone());
        }
    }
    log.sort_by_key(|e| e.seq);
}

impl MaterializedState {
    pub fn get_run(&self, id: &RunId) -> Option<&Run> {
        self.runs.get(id)
    }

    pub fn run_events(&self, id: &RunId) -> &[RunEvent] {
        self.run_events.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn runs_for_task(&self, task_id: &TaskId) -> Vec<&Run> {
        let mut runs: Vec<&Run> = self.runs.values().filter(|r| &r.task_id == task_id).collect();
        runs.sort_by_key(|r| r.created_at_ms);
        runs
    }

    /// The task's most recent Run, by `created_at_ms`, used to derive Task
    /// status when a Run reaches a terminal state.
    pub fn latest_run_for_task(&self, task_id: &TaskId) -> Option<&Run> {
        self.runs_for_task(task_id).into_iter().next_back()
    }

    /// All non-terminal Runs assigned to `node_id`, used by the watchdog to
    /// find runs orphaned by a node failing its heartbeat lease.
    pub fn nonterminal_runs_for_node(&self, node_id: &fleet_core::NodeId) -> Vec<&Run> {
        self.runs
            .values()
            .filter(|r| r.node_id.as_ref() == Some(node_id) && !r.status.is_terminal())
            .collect()
    }

    pub fn list_runs_by_status(&self, status: Option<RunStatus>) -> Vec<&Run> {
        let mut runs: Vec<&Run> =
            self.runs.values().filter(|r| status.is_none_or(|s| r.status == s)).collect();
        runs.sort_by_key(|r| r.created_at_ms);
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;

    #[test]
    fn events_appended_is_idempotent_on_duplicate_seq() {
        let mut state = MaterializedState::new();
        let run_id = RunId::from_string("run-1");
        let ev = RunEvent::run_started(run_id.clone(), 100);
        state.apply_event(&StoreEvent::RunEventsAppended {
            run_id: "run-1".to_string(),
            events: vec![ev.clone()],
        });
        state.apply_event(&StoreEvent::RunEventsAppended {
            run_id: "run-1".to_string(),
            events: vec![ev],
        });
        assert_eq!(state.run_events(&run_id).len(), 1);
    }

    #[test]
    fn latest_run_for_task_picks_most_recent() {
        let mut state = MaterializedState::new();
        let task_id = TaskId::from_string("task-1");
        let r1 = Run::builder().id(RunId::from_string("run-1")).task_id(task_id.clone()).created_at_ms(10u64).build();
        let r2 = Run::builder().id(RunId::from_string("run-2")).task_id(task_id.clone()).created_at_ms(20u64).build();
        state.apply_event(&StoreEvent::RunPut(r1));
        state.apply_event(&StoreEvent::RunPut(r2));
        assert_eq!(state.latest_run_for_task(&task_id).unwrap().id.to_string(), "run-2");
    }
}
