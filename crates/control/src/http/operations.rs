// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/operations` handlers (§4.4, §6).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{Account, Action, ActionId, ActionStatus, Operation, OperationId, OperationStatus};
use fleet_wire::pagination::{ListParams, Page};
use fleet_wire::request::CreateOperationRequest;
use fleet_wire::response::{OperationCreateResponse, OperationDetailResponse};

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn create_operation(
    State(state): State<SharedState>,
    Json(req): Json<CreateOperationRequest>,
) -> Result<(StatusCode, Json<OperationCreateResponse>), ApiError> {
    let now = state.clock.epoch_ms();
    let operation_id = OperationId::new();
    let action_id = ActionId::new();

    if req.operation_type.is_synchronous() {
        let name = req.config.get("name").and_then(|v| v.as_str()).ok_or_else(|| {
            ApiError::BadRequest("config.name is required for api_key operations".into())
        })?;
        let agent_type = req.config.get("agent_type").and_then(|v| v.as_str()).ok_or_else(|| {
            ApiError::BadRequest("config.agent_type is required for api_key operations".into())
        })?;

        let mut operation = Operation::new(operation_id, req.operation_type, req.config.clone(), req.node_id, now);
        operation.apply_terminal(OperationStatus::Completed, now);

        let mut action = Action::new(action_id, operation_id, now);
        action.finish(ActionStatus::Success, serde_json::json!({"ok": true}), None, now)
            .map_err(|e| ApiError::Conflict(e.to_string()))?;

        let account = Account::new(agent_type, name, req.node_id, now);
        let account_id = account.id.clone();

        state.store.create_synchronous_operation(operation, action, account)?;
        tracing::info!(target: "control", operation_id = %operation_id, account_id = %account_id, "[operations] synchronous api_key operation completed");

        return Ok((
            StatusCode::CREATED,
            Json(OperationCreateResponse {
                operation_id,
                action_id,
                account_id: Some(account_id),
                status: OperationStatus::Completed,
            }),
        ));
    }

    let operation = Operation::new(operation_id, req.operation_type, req.config, req.node_id, now);
    let action = Action::new(action_id, operation_id, now);
    state.store.put_operation(operation)?;
    state.store.put_action(action)?;
    tracing::info!(target: "control", operation_id = %operation_id, node_id = %req.node_id, "[operations] created operation");

    Ok((
        StatusCode::CREATED,
        Json(OperationCreateResponse {
            operation_id,
            action_id,
            account_id: None,
            status: OperationStatus::Pending,
        }),
    ))
}

pub async fn list_operations(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Operation>>, ApiError> {
    Ok(Json(state.store.list_operations(&params)?))
}

pub async fn get_operation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<OperationDetailResponse>, ApiError> {
    let id = OperationId::from_string(id);
    let operation = state.store.get_operation(&id)?.ok_or(ApiError::NotFound)?;
    let actions = state.store.action_for_operation(&id)?.into_iter().collect();
    Ok(Json(OperationDetailResponse { operation, actions }))
}
