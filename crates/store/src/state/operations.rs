// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{Action, ActionId, NodeId, Operation, OperationId};

pub(super) fn apply_operation_put(state: &mut MaterializedState, operation: &Operation) {
    state.operations.insert(operation.id.clone(), operation.clone());
}

pub(super) fn apply_action_put(state: &mut MaterializedState, action: &Action) {
    state.actions.insert(action.id.clone(), action.clone());
}

impl MaterializedState {
    pub fn get_operation(&self, id: &OperationId) -> Option<&Operation> {
        self.operations.get(id)
    }

    pub fn get_action(&self, id: &ActionId) -> Option<&Action> {
        self.actions.get(id)
    }

    /// The single Action dispatched for an Operation (one Action per
    /// Operation, per §3's Operation/Action relationship).
    pub fn action_for_operation(&self, operation_id: &OperationId) -> Option<&Action> {
        self.actions.values().find(|a| &a.operation_id == operation_id)
    }

    pub fn list_operations(&self) -> Vec<&Operation> {
        let mut ops: Vec<&Operation> = self.operations.values().collect();
        ops.sort_by_key(|o| o.created_at_ms);
        ops
    }

    /// All non-terminal Actions assigned via an Operation targeting
    /// `node_id`, used by the watchdog's node-failover reclaim pass.
    pub fn nonterminal_actions_for_node(&self, node_id: &NodeId) -> Vec<&Action> {
        self.actions
            .values()
            .filter(|a| !a.status.is_terminal())
            .filter(|a| self.operations.get(&a.operation_id).map(|op| &op.node_id) == Some(node_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;
    use fleet_core::{ActionStatus, NodeId, OperationType};

    #[test]
    fn action_for_operation_finds_the_dispatched_action() {
        let mut state = MaterializedState::new();
        let op = Operation::builder().id(OperationId::from_string("op-1")).build();
        let action = Action::builder()
            .id(ActionId::from_string("act-1"))
            .operation_id(OperationId::from_string("op-1"))
            .build();
        state.apply_event(&StoreEvent::OperationPut(op));
        state.apply_event(&StoreEvent::ActionPut(action));
        let found = state.action_for_operation(&OperationId::from_string("op-1")).unwrap();
        assert_eq!(found.id.to_string(), "act-1");
    }

    #[test]
    fn nonterminal_actions_for_node_joins_through_operation() {
        let mut state = MaterializedState::new();
        let node = NodeId::from_string("node-1");
        let op1 = Operation::builder()
            .id(OperationId::from_string("op-1"))
            .node_id(node.clone())
            .operation_type(OperationType::Oauth)
            .build();
        let op2 = Operation::builder()
            .id(OperationId::from_string("op-2"))
            .node_id(node.clone())
            .operation_type(OperationType::ApiKey)
            .build();
        let running = Action::builder()
            .id(ActionId::from_string("act-1"))
            .operation_id(OperationId::from_string("op-1"))
            .status(ActionStatus::Running)
            .build();
        let done = Action::builder()
            .id(ActionId::from_string("act-2"))
            .operation_id(OperationId::from_string("op-2"))
            .status(ActionStatus::Success)
            .build();
        state.apply_event(&StoreEvent::OperationPut(op1));
        state.apply_event(&StoreEvent::OperationPut(op2));
        state.apply_event(&StoreEvent::ActionPut(running));
        state.apply_event(&StoreEvent::ActionPut(done));

        let stuck = state.nonterminal_actions_for_node(&node);
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].id.to_string(), "act-1");
    }
}
