// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{Account, AccountId, Instance, InstanceId};

pub(super) fn apply_account_put(state: &mut MaterializedState, account: &Account) {
    state.accounts.insert(account.id.clone(), account.clone());
}

pub(super) fn apply_instance_put(state: &mut MaterializedState, instance: &Instance) {
    state.instances.insert(instance.id.clone(), instance.clone());
}

impl MaterializedState {
    pub fn get_account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn list_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by_key(|a| a.created_at_ms);
        accounts
    }

    pub fn get_instance(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn instances_for_account(&self, account_id: &AccountId) -> Vec<&Instance> {
        let mut instances: Vec<&Instance> =
            self.instances.values().filter(|i| &i.account_id == account_id).collect();
        instances.sort_by_key(|i| i.created_at_ms);
        instances
    }

    pub fn list_instances(&self) -> Vec<&Instance> {
        let mut instances: Vec<&Instance> = self.instances.values().collect();
        instances.sort_by_key(|i| i.created_at_ms);
        instances
    }

    pub fn pending_instances_for_node(&self, node_id: &fleet_core::NodeId) -> Vec<&Instance> {
        let mut instances: Vec<&Instance> = self
            .instances
            .values()
            .filter(|i| &i.node_id == node_id && i.status == fleet_core::InstanceStatus::Pending)
            .collect();
        instances.sort_by_key(|i| i.created_at_ms);
        instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;
    use fleet_core::NodeId;

    #[test]
    fn account_put_is_keyed_by_deterministic_id() {
        let mut state = MaterializedState::new();
        let account = Account::builder().build();
        let id = account.id.clone();
        state.apply_event(&StoreEvent::AccountPut(account));
        assert!(state.get_account(&id).is_some());
    }

    #[test]
    fn instances_for_account_filters_and_orders() {
        let mut state = MaterializedState::new();
        let account_id = AccountId::from_parts("claude", "dev@example.com");
        let i1 = Instance::new(
            InstanceId::from_string("inst-1"),
            "one".to_string(),
            account_id.clone(),
            "claude".to_string(),
            NodeId::from_string("node-1"),
            10,
        );
        let i2 = Instance::new(
            InstanceId::from_string("inst-2"),
            "two".to_string(),
            account_id.clone(),
            "claude".to_string(),
            NodeId::from_string("node-1"),
            20,
        );
        let other = Instance::new(
            InstanceId::from_string("inst-3"),
            "three".to_string(),
            AccountId::from_parts("codex", "ops@example.com"),
            "codex".to_string(),
            NodeId::from_string("node-1"),
            5,
        );
        state.apply_event(&StoreEvent::InstancePut(i1));
        state.apply_event(&StoreEvent::InstancePut(i2));
        state.apply_event(&StoreEvent::InstancePut(other));

        let found = state.instances_for_account(&account_id);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id.to_string(), "inst-1");
    }
}
