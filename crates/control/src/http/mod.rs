// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route table for the control-plane REST surface (§6).

pub mod accounts;
pub mod actions;
pub mod instances;
pub mod nodes;
pub mod operations;
pub mod proxies;
pub mod runs;
pub mod tasks;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/api/v1/tasks/:id", get(tasks::get_task).delete(tasks::delete_task))
        .route("/api/v1/tasks/:id/subtasks", get(tasks::list_subtasks))
        .route("/api/v1/tasks/:id/tree", get(tasks::task_tree))
        .route("/api/v1/tasks/:id/context", put(tasks::replace_context))
        .route("/api/v1/tasks/:id/execute", post(tasks::execute_task))
        .route("/api/v1/runs/:id", get(runs::get_run).patch(runs::patch_run))
        .route(
            "/api/v1/runs/:id/events",
            get(runs::list_run_events).post(runs::append_run_events),
        )
        .route("/api/v1/runs/:id/events/count", get(runs::run_events_count))
        .route("/api/v1/operations", post(operations::create_operation).get(operations::list_operations))
        .route("/api/v1/operations/:id", get(operations::get_operation))
        .route("/api/v1/actions/:id", get(actions::get_action).patch(actions::patch_action))
        .route("/api/v1/proxies", post(proxies::create_proxy).get(proxies::list_proxies))
        .route(
            "/api/v1/proxies/:id",
            get(proxies::get_proxy).put(proxies::update_proxy).delete(proxies::delete_proxy),
        )
        .route("/api/v1/proxies/:id/test", post(proxies::test_proxy))
        .route("/api/v1/nodes", get(nodes::list_nodes))
        .route("/api/v1/nodes/:id", get(nodes::get_node))
        .route("/api/v1/nodes/heartbeat", post(nodes::heartbeat))
        .route("/api/v1/nodes/:id/runs", get(runs::runs_for_node))
        .route("/api/v1/nodes/:id/actions", get(actions::actions_for_node))
        .route("/api/v1/nodes/:id/terminal-sessions", get(nodes::terminal_sessions_for_node))
        .route("/api/v1/terminal-sessions/:id", axum::routing::patch(nodes::patch_terminal_session))
        .route("/api/v1/nodes/:id/instances/pending", get(instances::pending_instances_for_node))
        .route("/api/v1/accounts", get(accounts::list_accounts))
        .route("/api/v1/accounts/:id", get(accounts::get_account))
        .route("/api/v1/instances", get(instances::list_instances))
        .route("/api/v1/instances/:id", get(instances::get_instance).patch(instances::patch_instance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
