// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{Node, NodeId};

pub(super) fn apply_put(state: &mut MaterializedState, node: &Node) {
    state.nodes_by_hostname.insert(node.hostname.clone(), node.id.clone());
    state.nodes.insert(node.id.clone(), node.clone());
}

impl MaterializedState {
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_by_hostname(&self, hostname: &str) -> Option<&Node> {
        self.nodes_by_hostname.get(hostname).and_then(|id| self.nodes.get(id))
    }

    pub fn list_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.created_at_ms);
        nodes
    }

    /// Candidate nodes for dispatch: online and matching every required label.
    pub fn matching_online_nodes(
        &self,
        required: &std::collections::HashMap<String, String>,
    ) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.status == fleet_core::NodeStatus::Online && n.satisfies_labels(required))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;

    #[test]
    fn put_indexes_by_hostname() {
        let mut state = MaterializedState::new();
        let node = Node::builder().id(NodeId::from_string("node-1")).hostname("worker-1".to_string()).build();
        state.apply_event(&StoreEvent::NodePut(node));
        assert_eq!(state.get_node_by_hostname("worker-1").unwrap().id.to_string(), "node-1");
    }

    #[test]
    fn reheartbeat_under_new_hostname_updates_index() {
        let mut state = MaterializedState::new();
        let node = Node::builder().id(NodeId::from_string("node-1")).hostname("worker-1".to_string()).build();
        state.apply_event(&StoreEvent::NodePut(node));
        let renamed = Node::builder().id(NodeId::from_string("node-1")).hostname("worker-1-renamed".to_string()).build();
        state.apply_event(&StoreEvent::NodePut(renamed));
        assert!(state.get_node_by_hostname("worker-1-renamed").is_some());
    }
}
