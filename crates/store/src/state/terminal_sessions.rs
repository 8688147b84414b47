// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{InstanceId, TerminalSession, TerminalSessionId};

pub(super) fn apply_put(state: &mut MaterializedState, session: &TerminalSession) {
    state.terminal_sessions.insert(session.id.clone(), session.clone());
}

impl MaterializedState {
    pub fn get_terminal_session(&self, id: &TerminalSessionId) -> Option<&TerminalSession> {
        self.terminal_sessions.get(id)
    }

    /// The non-terminal session currently open on `instance_id`, if any —
    /// at most one is expected to exist per the one-active-session rule
    /// enforced by the store's write path.
    pub fn active_terminal_session_for_instance(&self, instance_id: &InstanceId) -> Option<&TerminalSession> {
        self.terminal_sessions
            .values()
            .find(|s| &s.instance_id == instance_id && !s.status.is_terminal())
    }

    pub fn terminal_sessions_for_instance(&self, instance_id: &InstanceId) -> Vec<&TerminalSession> {
        let mut sessions: Vec<&TerminalSession> =
            self.terminal_sessions.values().filter(|s| &s.instance_id == instance_id).collect();
        sessions.sort_by_key(|s| s.created_at_ms);
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;
    use fleet_core::{NodeId, TerminalSessionStatus};

    #[test]
    fn active_session_excludes_closed_ones() {
        let mut state = MaterializedState::new();
        let instance_id = InstanceId::from_string("inst-1");
        let closed = TerminalSession::builder()
            .id(TerminalSessionId::from_string("term-1"))
            .instance_id(instance_id.clone())
            .node_id(NodeId::from_string("node-1"))
            .status(TerminalSessionStatus::Closed)
            .build();
        let running = TerminalSession::builder()
            .id(TerminalSessionId::from_string("term-2"))
            .instance_id(instance_id.clone())
            .node_id(NodeId::from_string("node-1"))
            .status(TerminalSessionStatus::Running)
            .build();
        state.apply_event(&StoreEvent::TerminalSessionPut(closed));
        state.apply_event(&StoreEvent::TerminalSessionPut(running));

        let active = state.active_terminal_session_for_instance(&instance_id).unwrap();
        assert_eq!(active.id.to_string(), "term-2");
    }
}
