// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.

mod accounts;
mod nodes;
mod operations;
mod proxies;
mod runs;
mod tasks;
mod terminal_sessions;

use crate::wal::StoreEvent;
use fleet_core::{
    Account, AccountId, Action, ActionId, Instance, InstanceId, Node, NodeId, Operation,
    OperationId, Proxy, ProxyId, Run, RunEvent, RunId, TerminalSession, TerminalSessionId, Task,
    TaskId,
};
use std::collections::HashMap;

/// In-memory materialized state derived by folding [`StoreEvent`]s, in the
/// style of the core crate's existing event-sourcing discipline.
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub tasks: HashMap<TaskId, Task>,
    /// parent_id -> direct children, so subtree traversal never needs a
    /// forward pointer stored on the parent row itself (§9 Cyclic references).
    pub task_children: HashMap<TaskId, Vec<TaskId>>,
    pub runs: HashMap<RunId, Run>,
    pub run_events: HashMap<RunId, Vec<RunEvent>>,
    pub operations: HashMap<OperationId, Operation>,
    pub actions: HashMap<ActionId, Action>,
    pub accounts: HashMap<AccountId, Account>,
    pub instances: HashMap<InstanceId, Instance>,
    pub terminal_sessions: HashMap<TerminalSessionId, TerminalSession>,
    pub nodes: HashMap<NodeId, Node>,
    pub nodes_by_hostname: HashMap<String, NodeId>,
    pub proxies: HashMap<ProxyId, Proxy>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All event handlers here must be idempotent: replaying the same
    /// event twice (once for immediate visibility, once on WAL replay
    /// after a restart) must leave state identical to applying it once.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::TaskPut(task) => tasks::apply_put(self, task),
            StoreEvent::TaskDeleted { task_id } => tasks::apply_deleted(self, task_id),
            StoreEvent::RunPut(run) => runs::apply_put(self, run),
            StoreEvent::RunEventsAppended { run_id, events } => {
                runs::apply_events_appended(self, run_id, events)
            }
            StoreEvent::OperationPut(operation) => operations::apply_operation_put(self, operation),
            StoreEvent::ActionPut(action) => operations::apply_action_put(self, action),
            StoreEvent::AccountPut(account) => accounts::apply_account_put(self, account),
            StoreEvent::InstancePut(instance) => accounts::apply_instance_put(self, instance),
            StoreEvent::TerminalSessionPut(session) => {
                terminal_sessions::apply_put(self, session)
            }
            StoreEvent::NodePut(node) => nodes::apply_put(self, node),
            StoreEvent::ProxyPut(proxy) => proxies::apply_put(self, proxy),
            StoreEvent::ProxyDeleted { proxy_id } => proxies::apply_deleted(self, proxy_id),
        }
    }
}
