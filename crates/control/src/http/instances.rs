// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/instances` read surface: the lookups the executor's container
//! dispatch resolves through before falling back to local name matching (§4.6).

use axum::extract::{Path, Query, State};
use axum::Json;
use fleet_core::{AccountId, Instance, InstanceId, InstanceStatus};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct InstancesQuery {
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchInstanceRequest {
    pub status: String,
}

pub async fn list_instances(
    State(state): State<SharedState>,
    Query(query): Query<InstancesQuery>,
) -> Result<Json<Vec<Instance>>, ApiError> {
    match query.account_id {
        Some(account_id) => Ok(Json(state.store.instances_for_account(&AccountId::from_string(account_id))?)),
        None => Ok(Json(state.store.list_instances()?)),
    }
}

pub async fn get_instance(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Instance>, ApiError> {
    let instance = state.store.get_instance(&InstanceId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(instance))
}

pub async fn pending_instances_for_node(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Instance>>, ApiError> {
    let instances = state.store.pending_instances_for_node(&fleet_core::NodeId::from_string(id))?;
    Ok(Json(instances))
}

/// Executor-reported transition once a container has actually started
/// (§4.6's instance loop). Only `running` is accepted here; termination
/// goes through the same verb with a terminal status.
pub async fn patch_instance(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<PatchInstanceRequest>,
) -> Result<Json<Instance>, ApiError> {
    let id = InstanceId::from_string(id);
    let mut instance = state.store.get_instance(&id)?.ok_or(ApiError::NotFound)?;
    let now = state.clock.epoch_ms();
    match req.status.as_str() {
        "running" => {
            instance.mark_running(now);
        }
        "stopped" => {
            instance.terminate(InstanceStatus::Stopped, now);
        }
        "error" => {
            instance.terminate(InstanceStatus::Error, now);
        }
        other => return Err(ApiError::BadRequest(format!("unsupported instance status {other:?}"))),
    }
    state.store.put_instance(instance.clone())?;
    Ok(Json(instance))
}
