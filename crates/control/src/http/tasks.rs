// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/tasks` handlers (§6).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{
    normalize_driver_name, RunSnapshot, Task, TaskContext, TaskId, TaskSpec, TaskStatus,
};
use fleet_wire::pagination::ListParams;
use fleet_wire::request::{CreateTaskRequest, ExecuteTaskRequest, ReplaceContextRequest};
use fleet_wire::response::{ExecuteTaskResponse, TaskResponse, TaskTreeResponse};

use crate::dispatch::assign_queued_runs;
use crate::error::ApiError;
use crate::state::SharedState;

pub async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }

    let parent_id = req.parent_id.as_deref().map(TaskId::from_string);
    let context = match &parent_id {
        Some(pid) => {
            let parent = state.store.get_task(pid)?.ok_or(ApiError::NotFound)?;
            Some(TaskContext::inherit_from(&parent.context.unwrap_or_default()))
        }
        None => None,
    };

    let now = state.clock.epoch_ms();
    let task = Task {
        id: TaskId::new(),
        parent_id,
        name: req.name,
        status: TaskStatus::Pending,
        spec: TaskSpec {
            prompt: req.prompt,
            workspace: req.workspace,
            security: req.security,
            labels: req.labels,
            agent_type: normalize_driver_name(&req.agent_type),
        },
        template_id: req.template_id,
        agent_id: None,
        context,
        created_at_ms: now,
        updated_at_ms: now,
    };
    state.store.put_task(task.clone())?;
    tracing::info!(target: "control", task_id = %task.id, "[tasks] created task");
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

pub async fn list_tasks(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<fleet_wire::pagination::Page<Task>>, ApiError> {
    let mut tasks = state.store.list_tasks()?;
    if let Some(status) = &params.status {
        tasks.retain(|t| t.status.to_string() == *status);
    }
    if let Some(search) = &params.search {
        let needle = search.to_lowercase();
        tasks.retain(|t| t.name.to_lowercase().contains(&needle));
    }
    if let Some(since) = params.since {
        tasks.retain(|t| t.created_at_ms >= since);
    }
    if let Some(until) = params.until {
        tasks.retain(|t| t.created_at_ms <= until);
    }
    tasks.sort_by_key(|t| t.created_at_ms);

    let total = tasks.len() as u64;
    let limit = params.effective_limit();
    let offset = params.effective_offset();
    let page_items = if (offset as usize) < tasks.len() {
        let mut rest = tasks.split_off(offset as usize);
        rest.truncate(limit as usize);
        rest
    } else {
        Vec::new()
    };
    Ok(Json(fleet_wire::pagination::Page::new(page_items, total, limit, offset)))
}

pub async fn get_task(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.store.get_task(&TaskId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(TaskResponse { task }))
}

pub async fn list_subtasks(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let id = TaskId::from_string(id);
    state.store.get_task(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(state.store.direct_children(&id)?))
}

pub async fn task_tree(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<TaskTreeResponse>, ApiError> {
    let id = TaskId::from_string(id);
    let root = state.store.get_task(&id)?.ok_or(ApiError::NotFound)?;
    let subtree = state.store.task_subtree(&id)?;

    let mut children_by_parent: HashMap<TaskId, Vec<Task>> = HashMap::new();
    for task in subtree {
        if let Some(parent_id) = task.parent_id {
            children_by_parent.entry(parent_id).or_default().push(task);
        }
    }

    fn build(task: Task, children_by_parent: &mut HashMap<TaskId, Vec<Task>>) -> TaskTreeResponse {
        let children = children_by_parent.remove(&task.id).unwrap_or_default();
        let children = children.into_iter().map(|c| build(c, children_by_parent)).collect();
        TaskTreeResponse { task, children }
    }

    Ok(Json(build(root, &mut children_by_parent)))
}

pub async fn replace_context(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ReplaceContextRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = TaskId::from_string(id);
    let mut task = state.store.get_task(&id)?.ok_or(ApiError::NotFound)?;
    task.context = Some(TaskContext { inherited: req.inherited, produced: req.produced, conversation: req.conversation });
    task.updated_at_ms = state.clock.epoch_ms();
    state.store.put_task(task.clone())?;
    Ok(Json(TaskResponse { task }))
}

pub async fn delete_task(State(state): State<SharedState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = TaskId::from_string(id);
    state.store.get_task(&id)?.ok_or(ApiError::NotFound)?;
    state.store.delete_task_cascade(&id)?;
    tracing::info!(target: "control", task_id = %id, "[tasks] deleted task cascade");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn execute_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ExecuteTaskRequest>,
) -> Result<(StatusCode, Json<ExecuteTaskResponse>), ApiError> {
    let task_id = TaskId::from_string(id);
    let task = state.store.get_task(&task_id)?.ok_or(ApiError::NotFound)?;

    let now = state.clock.epoch_ms();
    let snapshot = RunSnapshot { task_spec: task.spec.clone(), agent_config: req.agent_config };
    let run = fleet_core::Run::new(fleet_core::RunId::new(), task_id.clone(), snapshot, now);
    let run_id = run.id;
    state.store.put_run(run)?;

    // The Task stays `pending` until its first Run transitions to `running`
    // (cascaded from `patch_run`, §3 invariant 6).
    if let Err(err) = assign_queued_runs(&state) {
        tracing::warn!(target: "control", error = %err, "[dispatch] inline assignment after execute failed");
    }

    let run = state.store.get_run(&run_id)?.ok_or(ApiError::NotFound)?;
    tracing::info!(target: "control", task_id = %task_id, run_id = %run_id, "[tasks] executed task");
    Ok((StatusCode::CREATED, Json(ExecuteTaskResponse { run_id, status: run.status })))
}
