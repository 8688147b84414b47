// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run assignment: label-match-only, FIFO by `created_at` (§4.2).
//!
//! Called inline right after a Run is queued (so the common case assigns
//! within the same request) and again on every watchdog tick, so a Run
//! queued before any matching node was online still gets picked up.

use fleet_core::NodeStatus;
use tracing::info;

use crate::state::AppState;

/// Scan queued Runs oldest-first and assign each to the first online Node
/// whose labels satisfy the Run's snapshot. Returns how many were assigned.
pub fn assign_queued_runs(state: &AppState) -> Result<usize, fleet_store::StoreError> {
    let params = fleet_wire::pagination::ListParams {
        status: Some("queued".to_string()),
        limit: Some(fleet_wire::pagination::MAX_LIMIT),
        ..Default::default()
    };
    let queued = state.store.list_runs(&params)?;
    if queued.items.is_empty() {
        return Ok(0);
    }

    let nodes = state.store.list_nodes()?;
    let mut assigned = 0;
    for mut run in queued.items {
        let required = &run.snapshot.task_spec.labels;
        let Some(node) = nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Online && n.satisfies_labels(required))
            .min_by_key(|n| n.id.as_str())
        else {
            continue;
        };
        if run.assign(node.id).is_ok() {
            info!(target: "control", run_id = %run.id, node_id = %node.id, "[dispatch] assigned run");
            state.store.put_run(run)?;
            assigned += 1;
        }
    }
    Ok(assigned)
}
