// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node heartbeat and the executor's terminal-session pull endpoint (§4.2, §6).

use axum::extract::{Path, State};
use axum::Json;
use fleet_core::{Node, NodeId, TerminalSession, TerminalSessionId};
use fleet_wire::request::NodeHeartbeatRequest;
use fleet_wire::response::NodeHeartbeatResponse;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct PatchTerminalSessionRequest {
    pub status: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub url: Option<String>,
}

pub async fn heartbeat(
    State(state): State<SharedState>,
    Json(req): Json<NodeHeartbeatRequest>,
) -> Result<Json<NodeHeartbeatResponse>, ApiError> {
    let now = state.clock.epoch_ms();
    let node_id = req.node_id;
    state.store.upsert_node_heartbeat(req.node_id, req.hostname, req.ips, req.labels, req.capacity, now)?;
    if let Some(bus) = &state.bus {
        let payload = serde_json::json!({ "last_heartbeat_at_ms": now });
        if let Err(err) = bus.heartbeat(node_id.as_str(), payload).await {
            tracing::warn!(target: "bus", error = %err, node_id = %node_id, "[bus] heartbeat publish failed");
        }
    }
    Ok(Json(NodeHeartbeatResponse { node_id, accepted: true }))
}

pub async fn list_nodes(State(state): State<SharedState>) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.store.list_nodes()?))
}

pub async fn get_node(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Node>, ApiError> {
    let node = state.store.get_node(&NodeId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(node))
}

pub async fn terminal_sessions_for_node(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TerminalSession>>, ApiError> {
    let sessions = state.store.assigned_nonterminal_terminal_sessions_for_node(&NodeId::from_string(id))?;
    Ok(Json(sessions))
}

/// Executor-reported transition for a terminal session it started or closed
/// (§4.6's terminal loop, §8 seed scenario 6).
pub async fn patch_terminal_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<PatchTerminalSessionRequest>,
) -> Result<Json<TerminalSession>, ApiError> {
    let id = TerminalSessionId::from_string(id);
    let mut session = state.store.get_terminal_session(&id)?.ok_or(ApiError::NotFound)?;
    let now = state.clock.epoch_ms();
    match req.status.as_str() {
        "running" => {
            let port = req.port.ok_or_else(|| ApiError::BadRequest("port is required".into()))?;
            let url = req.url.ok_or_else(|| ApiError::BadRequest("url is required".into()))?;
            session.mark_running(port, url);
        }
        "closed" => {
            session.close(now);
        }
        other => return Err(ApiError::BadRequest(format!("unsupported terminal session status {other:?}"))),
    }
    state.store.put_terminal_session(session.clone())?;
    Ok(Json(session))
}
