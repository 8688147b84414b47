// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/runs` handlers plus the executor's node-pull endpoints (§6).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{NodeId, RunEvent, RunId};
use fleet_wire::request::{AppendEventsRequest, PatchRunRequest};
use fleet_wire::response::{EventsCountResponse, RunResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn get_run(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<RunResponse>, ApiError> {
    let run = state.store.get_run(&RunId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(RunResponse { run }))
}

pub async fn patch_run(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<PatchRunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let id = RunId::from_string(id);
    let mut run = state.store.get_run(&id)?.ok_or(ApiError::NotFound)?;
    let now = state.clock.epoch_ms();

    if run.status == fleet_core::RunStatus::Queued && req.status == fleet_core::RunStatus::Running {
        run.mark_running(now).map_err(|e| ApiError::Conflict(e.to_string()))?;
    }
    run.finish(req.status, req.error, now).map_err(|e| ApiError::Conflict(e.to_string()))?;
    // Cascades the running/terminal transition onto the parent Task under the
    // same store lock (§3 invariant 6).
    state.store.put_run_and_cascade_task(run.clone(), now)?;
    Ok(Json(RunResponse { run }))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub from_seq: u64,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn list_run_events(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(q): Query<EventsQuery>,
) -> Result<Json<Vec<RunEvent>>, ApiError> {
    let id = RunId::from_string(id);
    state.store.get_run(&id)?.ok_or(ApiError::NotFound)?;
    let limit = fleet_wire::pagination::coerce_limit(q.limit);
    Ok(Json(state.store.run_events(&id, q.from_seq, limit)?))
}

pub async fn run_events_count(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<EventsCountResponse>, ApiError> {
    let id = RunId::from_string(id);
    state.store.get_run(&id)?.ok_or(ApiError::NotFound)?;
    let count = state.store.run_events_count(&id)?;
    Ok(Json(EventsCountResponse { run_id: id, count }))
}

pub async fn append_run_events(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AppendEventsRequest>,
) -> Result<StatusCode, ApiError> {
    let id = RunId::from_string(id);
    state.store.get_run(&id)?.ok_or(ApiError::NotFound)?;
    let events: Vec<RunEvent> = req
        .events
        .into_iter()
        .map(|w| RunEvent {
            id: 0,
            run_id: id,
            seq: w.seq,
            event_type: fleet_core::EventType::from(w.event_type.as_str()),
            timestamp_ms: w.timestamp,
            payload: w.payload,
            raw: w.raw,
        })
        .collect();
    state.store.append_run_events(&id, events)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn runs_for_node(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let runs = state
        .store
        .assigned_nonterminal_runs_for_node(&NodeId::from_string(id))?
        .into_iter()
        .map(|run| RunResponse { run })
        .collect();
    Ok(Json(runs))
}
