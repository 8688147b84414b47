// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store boundary: a small `Store` trait plus the reference in-process,
//! WAL-backed implementation. Read calls never touch the WAL; every mutating
//! call appends to it under the same lock that updates the in-memory maps,
//! so a crash between "decided" and "applied" cannot happen (§4.1).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fleet_core::{
    Account, AccountId, Action, ActionId, ActionStatus, Instance, InstanceId, Node, NodeId,
    NodeStatus, Operation, OperationId, OperationStatus, Proxy, ProxyId, Run, RunEvent, RunId,
    RunStatus, Task, TaskId,
};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::state::MaterializedState;
use crate::wal::{StoreEvent, Wal};
use fleet_wire::pagination::{ListParams, Page};

/// Transactional record store exposing per-entity CRUD and the query shapes
/// the control plane needs. "Not found" is `Ok(None)`, never an `Err` (§4.1).
pub trait Store: Send + Sync {
    fn put_task(&self, task: Task) -> Result<(), StoreError>;
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;
    fn delete_task_cascade(&self, id: &TaskId) -> Result<(), StoreError>;
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;
    fn task_subtree(&self, id: &TaskId) -> Result<Vec<Task>, StoreError>;
    fn direct_children(&self, id: &TaskId) -> Result<Vec<Task>, StoreError>;

    fn put_run(&self, run: Run) -> Result<(), StoreError>;
    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError>;
    fn runs_for_task(&self, task_id: &TaskId) -> Result<Vec<Run>, StoreError>;
    fn list_runs(&self, params: &ListParams) -> Result<Page<Run>, StoreError>;
    fn assigned_nonterminal_runs_for_node(&self, node_id: &NodeId) -> Result<Vec<Run>, StoreError>;
    fn append_run_events(&self, run_id: &RunId, events: Vec<RunEvent>) -> Result<(), StoreError>;
    fn run_events(&self, run_id: &RunId, from_seq: u64, limit: u32) -> Result<Vec<RunEvent>, StoreError>;
    fn run_events_count(&self, run_id: &RunId) -> Result<u64, StoreError>;
    /// Reclaim assigned/running Runs whose `started_at` is still null and
    /// which were created before `older_than_ms` (the watchdog, §4.3).
    fn reclaim_stale_runs(&self, older_than_ms: u64) -> Result<Vec<RunId>, StoreError>;

    /// Persist a Run whose status was just transitioned and, under the same
    /// lock, cascade the corresponding transition onto its parent Task: the
    /// first Run to reach `running` moves the Task to `in_progress`, and a
    /// terminal Run status maps onto the Task's terminal status (§3
    /// invariant 6). A missing parent Task is not an error (orphaned Runs
    /// from a deleted Task cascade, see `delete_task_cascade`).
    fn put_run_and_cascade_task(&self, run: Run, now_ms: u64) -> Result<(), StoreError>;

    fn put_operation(&self, operation: Operation) -> Result<(), StoreError>;
    fn get_operation(&self, id: &OperationId) -> Result<Option<Operation>, StoreError>;
    fn list_operations(&self, params: &ListParams) -> Result<Page<Operation>, StoreError>;

    fn put_action(&self, action: Action) -> Result<(), StoreError>;
    fn get_action(&self, id: &ActionId) -> Result<Option<Action>, StoreError>;
    fn action_for_operation(&self, operation_id: &OperationId) -> Result<Option<Action>, StoreError>;
    fn assigned_nonterminal_actions_for_node(&self, node_id: &NodeId) -> Result<Vec<Action>, StoreError>;

    /// Creation handler for the synchronous `api_key` case (§4.4): Operation
    /// and Action are created `completed`/`success` atomically, and the
    /// Account row is materialised in the same transaction.
    fn create_synchronous_operation(
        &self,
        operation: Operation,
        action: Action,
        account: Account,
    ) -> Result<(), StoreError>;

    /// Apply a terminal Action status report: mark the Action terminal, map
    /// the owning Operation's terminal status, and (for the auth success
    /// path) get-or-update the Account row — all under one write lock.
    fn finish_action(
        &self,
        action_id: &ActionId,
        status: ActionStatus,
        result: serde_json::Value,
        error: Option<String>,
        now_ms: u64,
        on_success: Option<Account>,
    ) -> Result<(), StoreError>;

    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;
    fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;
    /// Get-or-update semantics: insert if absent, else refresh in place
    /// (§9 Account uniqueness resolution) — never a duplicate-key error.
    fn upsert_account(&self, account: Account) -> Result<(), StoreError>;

    fn put_instance(&self, instance: Instance) -> Result<(), StoreError>;
    fn get_instance(&self, id: &InstanceId) -> Result<Option<Instance>, StoreError>;
    fn list_instances(&self) -> Result<Vec<Instance>, StoreError>;
    fn instances_for_account(&self, account_id: &AccountId) -> Result<Vec<Instance>, StoreError>;
    fn pending_instances_for_node(&self, node_id: &NodeId) -> Result<Vec<Instance>, StoreError>;

    /// Open a new TerminalSession on `instance_id`, closing any other
    /// non-terminal session on the same instance first (exclusivity, §8
    /// seed scenario 6). Returns the ids closed as a side effect.
    fn open_terminal_session(
        &self,
        session: fleet_core::TerminalSession,
    ) -> Result<Vec<fleet_core::TerminalSessionId>, StoreError>;
    fn get_terminal_session(
        &self,
        id: &fleet_core::TerminalSessionId,
    ) -> Result<Option<fleet_core::TerminalSession>, StoreError>;
    fn put_terminal_session(&self, session: fleet_core::TerminalSession) -> Result<(), StoreError>;
    fn assigned_nonterminal_terminal_sessions_for_node(
        &self,
        node_id: &NodeId,
    ) -> Result<Vec<fleet_core::TerminalSession>, StoreError>;

    /// Upsert a Node by id, preserving administrative status, and
    /// deactivating any other row sharing the same hostname (§4.2).
    fn upsert_node_heartbeat(
        &self,
        id: NodeId,
        hostname: String,
        ips: Vec<String>,
        labels: HashMap<String, String>,
        capacity: HashMap<String, i64>,
        now_ms: u64,
    ) -> Result<Node, StoreError>;
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>, StoreError>;
    fn list_nodes(&self) -> Result<Vec<Node>, StoreError>;

    fn get_proxy(&self, id: &ProxyId) -> Result<Option<Proxy>, StoreError>;
    fn list_proxies(&self) -> Result<Vec<Proxy>, StoreError>;
    /// Insert or replace a Proxy by id. If `proxy.is_default` is set, clears
    /// `is_default` on every other proxy in the same commit, so at most one
    /// row can ever carry the flag.
    fn upsert_proxy(&self, proxy: Proxy) -> Result<(), StoreError>;
    fn delete_proxy(&self, id: &ProxyId) -> Result<(), StoreError>;
}

/// Reference `Store`: a materialized state fronted by a WAL, both guarded by
/// one lock so "decide" (append) and "apply" (mutate the maps) never race.
pub struct EventSourcedStore {
    inner: Mutex<Inner>,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

impl EventSourcedStore {
    /// Open (or create) the WAL at `path` and replay it to rebuild state.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, StoreError> {
        let mut wal = Wal::open(path, 0)?;
        let mut state = MaterializedState::new();
        wal.replay(|event| state.apply_event(event))?;
        Ok(Arc::new(Self { inner: Mutex::new(Inner { wal, state }) }))
    }

    /// Append one event and fold it into state under the write lock.
    fn commit(&self, event: StoreEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        Ok(())
    }

    /// Append a batch of events as a single all-or-nothing unit: any
    /// serialization failure aborts before any event in the batch is
    /// folded into state (the row-level transaction primitive §4.1 asks for).
    fn commit_all(&self, events: Vec<StoreEvent>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let mut seqs = Vec::with_capacity(events.len());
        for event in &events {
            seqs.push(inner.wal.append(event)?);
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(())
    }
}

impl Store for EventSourcedStore {
    fn put_task(&self, task: Task) -> Result<(), StoreError> {
        self.commit(StoreEvent::TaskPut(task))
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.lock().state.get_task(id).cloned())
    }

    /// Deletes the Task and its full subtree. Runs/Events belonging to the
    /// deleted tasks are left in the store (nothing reachable from a live
    /// Task can surface them again); see DESIGN.md for why physical Run/Event
    /// deletion is not wired up here.
    fn delete_task_cascade(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let ids = inner.state.task_and_subtree_ids(id);
        let events: Vec<StoreEvent> =
            ids.iter().rev().map(|task_id| StoreEvent::TaskDeleted { task_id: task_id.to_string() }).collect();
        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(())
    }

    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.inner.lock().state.list_tasks().cloned().collect())
    }

    fn task_subtree(&self, id: &TaskId) -> Result<Vec<Task>, StoreError> {
        Ok(self.inner.lock().state.subtree(id).into_iter().cloned().collect())
    }

    fn direct_children(&self, id: &TaskId) -> Result<Vec<Task>, StoreError> {
        Ok(self.inner.lock().state.direct_children(id).into_iter().cloned().collect())
    }

    fn put_run(&self, run: Run) -> Result<(), StoreError> {
        self.commit(StoreEvent::RunPut(run))
    }

    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.inner.lock().state.get_run(id).cloned())
    }

    fn put_run_and_cascade_task(&self, run: Run, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let mut events = vec![StoreEvent::RunPut(run.clone())];
        if let Some(mut task) = inner.state.get_task(&run.task_id).cloned() {
            let changed = if run.status == RunStatus::Running {
                task.mark_in_progress(now_ms)
            } else if run.status.is_terminal() {
                task.apply_run_terminal(run.status, now_ms)
            } else {
                false
            };
            if changed {
                events.push(StoreEvent::TaskPut(task));
            }
        }
        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(())
    }

    fn runs_for_task(&self, task_id: &TaskId) -> Result<Vec<Run>, StoreError> {
        Ok(self.inner.lock().state.runs_for_task(task_id).into_iter().cloned().collect())
    }

    fn list_runs(&self, params: &ListParams) -> Result<Page<Run>, StoreError> {
        let inner = self.inner.lock();
        let status: Option<RunStatus> = params.status.as_deref().map(run_status_from_str);
        let all = inner.state.list_runs_by_status(status);
        Ok(paginate(all, params))
    }

    fn assigned_nonterminal_runs_for_node(&self, node_id: &NodeId) -> Result<Vec<Run>, StoreError> {
        let inner = self.inner.lock();
        let mut runs: Vec<Run> = inner
            .state
            .nonterminal_runs_for_node(node_id)
            .into_iter()
            .filter(|r| r.status == RunStatus::Assigned || r.status == RunStatus::Running)
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.created_at_ms);
        Ok(runs)
    }

    fn append_run_events(&self, run_id: &RunId, events: Vec<RunEvent>) -> Result<(), StoreError> {
        self.commit(StoreEvent::RunEventsAppended { run_id: run_id.to_string(), events })
    }

    fn run_events(&self, run_id: &RunId, from_seq: u64, limit: u32) -> Result<Vec<RunEvent>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .state
            .run_events(run_id)
            .iter()
            .filter(|e| e.seq > from_seq)
            .take(limit.max(1) as usize)
            .cloned()
            .collect())
    }

    fn run_events_count(&self, run_id: &RunId) -> Result<u64, StoreError> {
        Ok(self.inner.lock().state.run_events(run_id).len() as u64)
    }

    fn reclaim_stale_runs(&self, older_than_ms: u64) -> Result<Vec<RunId>, StoreError> {
        let mut inner = self.inner.lock();
        let stale: Vec<Run> = inner
            .state
            .list_runs_by_status(None)
            .into_iter()
            .filter(|r| {
                !r.status.is_terminal()
                    && r.status != RunStatus::Queued
                    && r.started_at_ms.is_none()
                    && r.created_at_ms < older_than_ms
            })
            .cloned()
            .collect();
        let mut reclaimed = Vec::new();
        let mut events = Vec::new();
        for mut run in stale {
            if run.reclaim_to_queued() {
                reclaimed.push(run.id.clone());
                events.push(StoreEvent::RunPut(run));
            }
        }
        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(reclaimed)
    }

    fn put_operation(&self, operation: Operation) -> Result<(), StoreError> {
        self.commit(StoreEvent::OperationPut(operation))
    }

    fn get_operation(&self, id: &OperationId) -> Result<Option<Operation>, StoreError> {
        Ok(self.inner.lock().state.get_operation(id).cloned())
    }

    fn list_operations(&self, params: &ListParams) -> Result<Page<Operation>, StoreError> {
        let inner = self.inner.lock();
        let mut all: Vec<Operation> = inner.state.list_operations().into_iter().cloned().collect();
        if let Some(status) = &params.status {
            all.retain(|o| &o.status.to_string() == status);
        }
        if let Some(op_type) = &params.search {
            all.retain(|o| o.operation_type.as_str() == op_type);
        }
        all.sort_by_key(|o| o.created_at_ms);
        Ok(paginate(all, params))
    }

    fn put_action(&self, action: Action) -> Result<(), StoreError> {
        self.commit(StoreEvent::ActionPut(action))
    }

    fn get_action(&self, id: &ActionId) -> Result<Option<Action>, StoreError> {
        Ok(self.inner.lock().state.get_action(id).cloned())
    }

    fn action_for_operation(&self, operation_id: &OperationId) -> Result<Option<Action>, StoreError> {
        Ok(self.inner.lock().state.action_for_operation(operation_id).cloned())
    }

    fn assigned_nonterminal_actions_for_node(&self, node_id: &NodeId) -> Result<Vec<Action>, StoreError> {
        let inner = self.inner.lock();
        let mut actions: Vec<Action> =
            inner.state.nonterminal_actions_for_node(node_id).into_iter().cloned().collect();
        actions.sort_by_key(|a| a.created_at_ms);
        Ok(actions)
    }

    fn create_synchronous_operation(
        &self,
        operation: Operation,
        action: Action,
        account: Account,
    ) -> Result<(), StoreError> {
        self.commit_all(vec![
            StoreEvent::OperationPut(operation),
            StoreEvent::ActionPut(action),
            StoreEvent::AccountPut(account),
        ])
    }

    fn finish_action(
        &self,
        action_id: &ActionId,
        status: ActionStatus,
        result: serde_json::Value,
        error: Option<String>,
        now_ms: u64,
        on_success: Option<Account>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Some(mut action) = inner.state.get_action(action_id).cloned() else {
            return Ok(());
        };
        if action.status.is_terminal() {
            return Ok(());
        }
        action
            .finish(status, result, error, now_ms)
            .map_err(|e| StoreError::Corrupt { seq: 0, reason: e.to_string() })?;

        let mut events = vec![StoreEvent::ActionPut(action.clone())];

        if let Some(mut operation) = inner.state.get_operation(&action.operation_id).cloned() {
            if let Some(terminal) = OperationStatus::from_action_terminal(action.status) {
                operation.apply_terminal(terminal, now_ms);
                events.push(StoreEvent::OperationPut(operation));
            }
        }
        if action.status == ActionStatus::Success {
            if let Some(mut account) = on_success {
                if let Some(existing) = inner.state.get_account(&account.id) {
                    account = existing.clone();
                }
                account.mark_authenticated(now_ms);
                events.push(StoreEvent::AccountPut(account));
            }
        }

        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(())
    }

    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.lock().state.get_account(id).cloned())
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.inner.lock().state.list_accounts().into_iter().cloned().collect())
    }

    fn upsert_account(&self, mut account: Account) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.state.get_account(&account.id) {
            account.created_at_ms = existing.created_at_ms;
        }
        inner.wal.append(&StoreEvent::AccountPut(account.clone()))?;
        inner.state.apply_event(&StoreEvent::AccountPut(account));
        Ok(())
    }

    fn put_instance(&self, instance: Instance) -> Result<(), StoreError> {
        self.commit(StoreEvent::InstancePut(instance))
    }

    fn get_instance(&self, id: &InstanceId) -> Result<Option<Instance>, StoreError> {
        Ok(self.inner.lock().state.get_instance(id).cloned())
    }

    fn list_instances(&self) -> Result<Vec<Instance>, StoreError> {
        Ok(self.inner.lock().state.list_instances().into_iter().cloned().collect())
    }

    fn instances_for_account(&self, account_id: &AccountId) -> Result<Vec<Instance>, StoreError> {
        Ok(self.inner.lock().state.instances_for_account(account_id).into_iter().cloned().collect())
    }

    fn pending_instances_for_node(&self, node_id: &NodeId) -> Result<Vec<Instance>, StoreError> {
        Ok(self.inner.lock().state.pending_instances_for_node(node_id).into_iter().cloned().collect())
    }

    fn open_terminal_session(
        &self,
        session: fleet_core::TerminalSession,
    ) -> Result<Vec<fleet_core::TerminalSessionId>, StoreError> {
        let mut inner = self.inner.lock();
        let mut closed_ids = Vec::new();
        let mut events = Vec::new();
        if let Some(active) = inner.state.active_terminal_session_for_instance(&session.instance_id) {
            let mut closing = active.clone();
            if closing.close(session.created_at_ms) {
                closed_ids.push(closing.id.clone());
                events.push(StoreEvent::TerminalSessionPut(closing));
            }
        }
        events.push(StoreEvent::TerminalSessionPut(session));
        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(closed_ids)
    }

    fn get_terminal_session(
        &self,
        id: &fleet_core::TerminalSessionId,
    ) -> Result<Option<fleet_core::TerminalSession>, StoreError> {
        Ok(self.inner.lock().state.get_terminal_session(id).cloned())
    }

    fn put_terminal_session(&self, session: fleet_core::TerminalSession) -> Result<(), StoreError> {
        self.commit(StoreEvent::TerminalSessionPut(session))
    }

    fn assigned_nonterminal_terminal_sessions_for_node(
        &self,
        node_id: &NodeId,
    ) -> Result<Vec<fleet_core::TerminalSession>, StoreError> {
        let inner = self.inner.lock();
        let mut sessions: Vec<fleet_core::TerminalSession> = inner
            .state
            .terminal_sessions
            .values()
            .filter(|s| &s.node_id == node_id && !s.status.is_terminal())
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at_ms);
        Ok(sessions)
    }

    fn upsert_node_heartbeat(
        &self,
        id: NodeId,
        hostname: String,
        ips: Vec<String>,
        labels: HashMap<String, String>,
        capacity: HashMap<String, i64>,
        now_ms: u64,
    ) -> Result<Node, StoreError> {
        let mut inner = self.inner.lock();
        let mut events = Vec::new();

        // Deactivate any other Node row claiming the same hostname (§4.2):
        // disambiguates a duplicate registration after a host reinstall.
        if let Some(stale) = inner.state.get_node_by_hostname(&hostname) {
            if stale.id != id && stale.status != NodeStatus::Terminated {
                let mut stale = stale.clone();
                stale.status = NodeStatus::Terminated;
                events.push(StoreEvent::NodePut(stale));
            }
        }

        let node = match inner.state.get_node(&id) {
            Some(existing) => {
                let status = if existing.status.is_administrative() { existing.status } else { NodeStatus::Online };
                Node {
                    id: id.clone(),
                    hostname,
                    ips,
                    labels,
                    capacity,
                    status,
                    last_heartbeat_at_ms: now_ms,
                    created_at_ms: existing.created_at_ms,
                }
            }
            None => Node {
                id: id.clone(),
                hostname,
                ips,
                labels,
                capacity,
                status: NodeStatus::Online,
                last_heartbeat_at_ms: now_ms,
                created_at_ms: now_ms,
            },
        };
        events.push(StoreEvent::NodePut(node.clone()));

        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(node)
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.inner.lock().state.get_node(id).cloned())
    }

    fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.inner.lock().state.list_nodes().into_iter().cloned().collect())
    }

    fn get_proxy(&self, id: &ProxyId) -> Result<Option<Proxy>, StoreError> {
        Ok(self.inner.lock().state.get_proxy(id).cloned())
    }

    fn list_proxies(&self) -> Result<Vec<Proxy>, StoreError> {
        Ok(self.inner.lock().state.list_proxies().into_iter().cloned().collect())
    }

    fn upsert_proxy(&self, proxy: Proxy) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let mut events = Vec::new();
        if proxy.is_default {
            for other in inner.state.list_proxies() {
                if other.id != proxy.id && other.is_default {
                    let mut cleared = other.clone();
                    cleared.is_default = false;
                    events.push(StoreEvent::ProxyPut(cleared));
                }
            }
        }
        events.push(StoreEvent::ProxyPut(proxy));
        for event in &events {
            inner.wal.append(event)?;
        }
        for event in &events {
            inner.state.apply_event(event);
        }
        Ok(())
    }

    fn delete_proxy(&self, id: &ProxyId) -> Result<(), StoreError> {
        self.commit(StoreEvent::ProxyDeleted { proxy_id: id.to_string() })
    }
}

fn run_status_from_str(s: &str) -> RunStatus {
    match s {
        "assigned" => RunStatus::Assigned,
        "running" => RunStatus::Running,
        "done" => RunStatus::Done,
        "failed" => RunStatus::Failed,
        "cancelled" => RunStatus::Cancelled,
        "timeout" => RunStatus::Timeout,
        _ => RunStatus::Queued,
    }
}

/// Filter+sort-at-query-time pagination over an already-ordered `Vec<T>`.
/// No secondary sorted indices are maintained; list queries pay an O(n)
/// scan per call, acceptable at this store's scale (§4.1 is silent on
/// index structure, only on query *shape*).
fn paginate<T: Clone>(mut items: Vec<T>, params: &ListParams) -> Page<T> {
    let total = items.len() as u64;
    let limit = params.effective_limit();
    let offset = params.effective_offset();
    if (offset as usize) < items.len() {
        items = items.split_off(offset as usize);
    } else {
        items.clear();
    }
    items.truncate(limit as usize);
    Page::new(items, total, limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{AccountId, NodeId, OperationType, TaskId};
    use tempfile::tempdir;

    fn store() -> Arc<EventSourcedStore> {
        let dir = tempdir().unwrap();
        EventSourcedStore::open(dir.path().join("test.wal")).unwrap()
    }

    #[test]
    fn get_on_absent_key_is_ok_none_not_err() {
        let store = store();
        assert!(store.get_task(&TaskId::from_string("task-nope")).unwrap().is_none());
    }

    #[test]
    fn duplicate_event_seq_is_dropped_silently() {
        let store = store();
        let run = Run::builder().id(RunId::from_string("run-1")).build();
        store.put_run(run).unwrap();
        let run_id = RunId::from_string("run-1");
        let ev = RunEvent::run_started(run_id.clone(), 10);
        store.append_run_events(&run_id, vec![ev.clone()]).unwrap();
        store.append_run_events(&run_id, vec![ev]).unwrap();
        assert_eq!(store.run_events_count(&run_id).unwrap(), 1);
    }

    #[test]
    fn synchronous_operation_creates_account_in_one_call() {
        let store = store();
        let node_id = NodeId::from_string("node-1");
        let account_id = AccountId::from_parts("qwen-code", "dev@example.com");
        let operation = Operation::builder()
            .id(OperationId::from_string("op-1"))
            .node_id(node_id.clone())
            .operation_type(OperationType::ApiKey)
            .status(OperationStatus::Completed)
            .build();
        let action = Action::builder()
            .id(ActionId::from_string("act-1"))
            .operation_id(OperationId::from_string("op-1"))
            .status(ActionStatus::Success)
            .build();
        let account = Account::new("qwen-code", "dev@example.com", node_id, 0);
        store.create_synchronous_operation(operation, action, account).unwrap();

        assert_eq!(store.get_operation(&OperationId::from_string("op-1")).unwrap().unwrap().status, OperationStatus::Completed);
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().status, fleet_core::AccountStatus::Authenticated);
    }

    #[test]
    fn finish_action_rejects_second_terminal_transition() {
        let store = store();
        let action = Action::builder().id(ActionId::from_string("act-1")).status(ActionStatus::Running).build();
        store.put_action(action).unwrap();
        store
            .finish_action(&ActionId::from_string("act-1"), ActionStatus::Success, serde_json::json!({}), None, 10, None)
            .unwrap();
        let before = store.get_action(&ActionId::from_string("act-1")).unwrap().unwrap();
        store
            .finish_action(&ActionId::from_string("act-1"), ActionStatus::Failed, serde_json::Value::Null, Some("late".into()), 20, None)
            .unwrap();
        let after = store.get_action(&ActionId::from_string("act-1")).unwrap().unwrap();
        assert_eq!(before.status, after.status);
        assert_eq!(after.status, ActionStatus::Success);
    }

    #[test]
    fn open_terminal_session_closes_prior_active_session() {
        let store = store();
        let instance_id = fleet_core::InstanceId::from_string("inst-1");
        let s1 = fleet_core::TerminalSession::builder()
            .id(fleet_core::TerminalSessionId::from_string("term-1"))
            .instance_id(instance_id.clone())
            .status(fleet_core::TerminalSessionStatus::Running)
            .build();
        store.put_terminal_session(s1).unwrap();

        let s2 = fleet_core::TerminalSession::builder()
            .id(fleet_core::TerminalSessionId::from_string("term-2"))
            .instance_id(instance_id)
            .status(fleet_core::TerminalSessionStatus::Running)
            .created_at_ms(100u64)
            .build();
        let closed = store.open_terminal_session(s2).unwrap();
        assert_eq!(closed, vec![fleet_core::TerminalSessionId::from_string("term-1")]);
        assert_eq!(
            store.get_terminal_session(&fleet_core::TerminalSessionId::from_string("term-1")).unwrap().unwrap().status,
            fleet_core::TerminalSessionStatus::Closed
        );
    }

    #[test]
    fn node_heartbeat_preserves_administrative_status() {
        let store = store();
        let id = NodeId::from_string("node-1");
        store.upsert_node_heartbeat(id.clone(), "h1".into(), vec![], HashMap::new(), HashMap::new(), 0).unwrap();
        let mut draining = store.get_node(&id).unwrap().unwrap();
        draining.status = NodeStatus::Draining;
        store.inner.lock().state.nodes.insert(id.clone(), draining);

        let after = store.upsert_node_heartbeat(id.clone(), "h1".into(), vec![], HashMap::new(), HashMap::new(), 10).unwrap();
        assert_eq!(after.status, NodeStatus::Draining);
    }

    #[test]
    fn node_heartbeat_deactivates_stale_hostname_duplicate() {
        let store = store();
        store.upsert_node_heartbeat(NodeId::from_string("node-1"), "worker-1".into(), vec![], HashMap::new(), HashMap::new(), 0).unwrap();
        store.upsert_node_heartbeat(NodeId::from_string("node-2"), "worker-1".into(), vec![], HashMap::new(), HashMap::new(), 10).unwrap();
        assert_eq!(store.get_node(&NodeId::from_string("node-1")).unwrap().unwrap().status, NodeStatus::Terminated);
        assert_eq!(store.get_node(&NodeId::from_string("node-2")).unwrap().unwrap().status, NodeStatus::Online);
    }

    #[test]
    fn upsert_proxy_clears_default_on_other_rows() {
        let store = store();
        let a = fleet_core::Proxy::builder()
            .id(fleet_core::ProxyId::from_string("proxy-a"))
            .name("a")
            .is_default(true)
            .build();
        store.upsert_proxy(a).unwrap();

        let b = fleet_core::Proxy::builder()
            .id(fleet_core::ProxyId::from_string("proxy-b"))
            .name("b")
            .is_default(true)
            .build();
        store.upsert_proxy(b).unwrap();

        assert!(!store.get_proxy(&fleet_core::ProxyId::from_string("proxy-a")).unwrap().unwrap().is_default);
        assert!(store.get_proxy(&fleet_core::ProxyId::from_string("proxy-b")).unwrap().unwrap().is_default);
    }

    #[test]
    fn delete_proxy_removes_it() {
        let store = store();
        let p = fleet_core::Proxy::builder().id(fleet_core::ProxyId::from_string("proxy-a")).build();
        store.upsert_proxy(p).unwrap();
        store.delete_proxy(&fleet_core::ProxyId::from_string("proxy-a")).unwrap();
        assert!(store.get_proxy(&fleet_core::ProxyId::from_string("proxy-a")).unwrap().is_none());
    }

    #[test]
    fn reclaim_stale_runs_resets_assigned_never_started() {
        let store = store();
        let run = Run::builder()
            .id(RunId::from_string("run-1"))
            .status(RunStatus::Assigned)
            .node_id(Some(NodeId::from_string("node-1")))
            .created_at_ms(0u64)
            .build();
        store.put_run(run).unwrap();
        let reclaimed = store.reclaim_stale_runs(1000).unwrap();
        assert_eq!(reclaimed, vec![RunId::from_string("run-1")]);
        let after = store.get_run(&RunId::from_string("run-1")).unwrap().unwrap();
        assert_eq!(after.status, RunStatus::Queued);
        assert!(after.node_id.is_none());
    }
}
