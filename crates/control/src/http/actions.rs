// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/actions` handlers plus the node-pull endpoint (§4.4, §6).

use axum::extract::{Path, State};
use axum::Json;
use fleet_core::{ActionId, ActionStatus, NodeId};
use fleet_wire::request::PatchActionRequest;
use fleet_wire::response::ActionDetailResponse;

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn get_action(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionDetailResponse>, ApiError> {
    let id = ActionId::from_string(id);
    let action = state.store.get_action(&id)?.ok_or(ApiError::NotFound)?;
    let operation = state.store.get_operation(&action.operation_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(ActionDetailResponse { action, operation }))
}

pub async fn patch_action(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<PatchActionRequest>,
) -> Result<Json<ActionDetailResponse>, ApiError> {
    let id = ActionId::from_string(id);
    let action = state.store.get_action(&id)?.ok_or(ApiError::NotFound)?;
    if action.status.is_terminal() {
        return Err(ApiError::Conflict(format!("action {id} is already terminal ({})", action.status)));
    }
    let now = state.clock.epoch_ms();

    let operation_id = action.operation_id;

    if req.status.is_terminal() {
        let on_success = if req.status == ActionStatus::Success {
            account_from_operation_config(&state, &operation_id)?
        } else {
            None
        };
        state.store.finish_action(&id, req.status, req.result, req.error, now, on_success)?;
    } else {
        let mut action = action;
        action
            .report_progress(req.status, req.phase, req.message, req.progress, now)
            .map_err(|e| ApiError::Conflict(e.to_string()))?;
        state.store.put_action(action)?;

        if req.status == ActionStatus::Running {
            if let Some(mut operation) = state.store.get_operation(&operation_id)? {
                operation.bump_in_progress(now);
                state.store.put_operation(operation)?;
            }
        }
    }

    let action = state.store.get_action(&id)?.ok_or(ApiError::NotFound)?;
    let operation = state.store.get_operation(&action.operation_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(ActionDetailResponse { action, operation }))
}

/// For an auth Operation's success report, derive the Account that should be
/// get-or-updated to `authenticated` (§4.4, §9) from the Operation's config.
fn account_from_operation_config(
    state: &SharedState,
    operation_id: &fleet_core::OperationId,
) -> Result<Option<fleet_core::Account>, ApiError> {
    let Some(operation) = state.store.get_operation(operation_id)? else {
        return Ok(None);
    };
    if !matches!(operation.operation_type, fleet_core::OperationType::Oauth | fleet_core::OperationType::DeviceCode) {
        return Ok(None);
    }
    let name = operation.config.get("name").and_then(|v| v.as_str());
    let agent_type = operation.config.get("agent_type").and_then(|v| v.as_str());
    let (Some(name), Some(agent_type)) = (name, agent_type) else {
        return Ok(None);
    };
    let now = state.clock.epoch_ms();
    Ok(Some(fleet_core::Account::new(agent_type, name, operation.node_id, now)))
}

pub async fn actions_for_node(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActionDetailResponse>>, ApiError> {
    let actions = state.store.assigned_nonterminal_actions_for_node(&NodeId::from_string(id))?;
    let mut out = Vec::with_capacity(actions.len());
    for action in actions {
        let operation = state.store.get_operation(&action.operation_id)?.ok_or(ApiError::NotFound)?;
        out.push(ActionDetailResponse { action, operation });
    }
    Ok(Json(out))
}
