// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coverage of the control-plane REST surface against the
//! invariants, round-trip properties, boundary behaviours, and seed
//! scenarios the Task/Run/Operation/Action model is built on.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use fleet_control::{AppState, Config};
use fleet_core::FakeClock;
use fleet_store::EventSourcedStore;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    router: Router,
    state: Arc<AppState>,
    clock: Arc<FakeClock>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = EventSourcedStore::open(dir.path().join("test.wal")).unwrap();
    let clock = Arc::new(FakeClock::new());
    let state = Arc::new(AppState::with_clock(store, None, Config::default(), clock.clone()));
    let router = fleet_control::http::router(state.clone());
    Harness { router, state, clock, _dir: dir }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
            None => Body::empty(),
        })
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn create_task(router: &Router, name: &str, agent_type: &str) -> Value {
    let (status, body) = call(
        router,
        "POST",
        "/api/v1/tasks",
        Some(json!({
            "name": name,
            "prompt": "do the thing",
            "agent_type": agent_type,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn register_node(router: &Router, id: &str, labels: Value) -> Value {
    let (status, body) = call(
        router,
        "POST",
        "/api/v1/nodes/heartbeat",
        Some(json!({
            "node_id": id,
            "hostname": format!("{id}.local"),
            "ips": ["10.0.0.1"],
            "labels": labels,
            "capacity": {},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

// --- seed scenario 1: Task -> Run -> Event happy path -----------------

#[tokio::test]
async fn task_create_execute_and_event_stream() {
    let h = harness();
    let router = &h.router;

    register_node(router, "node-1", json!({"gpu": "false"})).await;
    let task = create_task(router, "build the docs", "claude").await;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, exec) = call(router, "POST", &format!("/api/v1/tasks/{task_id}/execute"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let run_id = exec["run_id"].as_str().unwrap().to_string();
    // With a label-less node already online, inline dispatch assigns immediately.
    assert_eq!(exec["status"], "assigned");

    // The Task stays `pending` until the Run actually starts running.
    let (status, task_after) = call(router, "GET", &format!("/api/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task_after["status"], "pending");

    let (status, _) = call(router, "PATCH", &format!("/api/v1/runs/{run_id}"), Some(json!({"status": "running"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, task_after) = call(router, "GET", &format!("/api/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task_after["status"], "in_progress");

    let (status, _) = call(
        router,
        "POST",
        &format!("/api/v1/runs/{run_id}/events"),
        Some(json!({
            "events": [
                {"seq": 1, "type": "run_started", "timestamp": 1000, "payload": {}},
                {"seq": 2, "type": "agent_text", "timestamp": 1001, "payload": {"text": "hi"}},
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(router, "PATCH", &format!("/api/v1/runs/{run_id}"), Some(json!({"status": "done"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, events) = call(router, "GET", &format!("/api/v1/runs/{run_id}/events?from_seq=0"), None).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["seq"], 1);
    assert_eq!(events[1]["seq"], 2);

    let (status, run) = call(router, "GET", &format!("/api/v1/runs/{run_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "done");
    assert!(run["started_at_ms"].as_u64().unwrap() > 0);
    assert!(run["finished_at_ms"].as_u64().unwrap() > 0);

    // The completed Run cascades the Task to `completed` (§3 invariant 6).
    let (status, task_after) = call(router, "GET", &format!("/api/v1/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task_after["status"], "completed");
}

// --- seed scenario 2: api_key operation settles synchronously ----------

#[tokio::test]
async fn api_key_operation_is_synchronous() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;

    let (status, created) = call(
        router,
        "POST",
        "/api/v1/operations",
        Some(json!({
            "type": "api_key",
            "node_id": "node-1",
            "config": {"name": "dev@example.com", "agent_type": "claude", "key": "sk-test"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "completed");
    assert_eq!(created["account_id"], "claude_dev_example_com");

    let operation_id = created["operation_id"].as_str().unwrap();
    let (status, detail) = call(router, "GET", &format!("/api/v1/operations/{operation_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "completed");
    let actions = detail["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["status"], "success");
}

// --- seed scenario 3: oauth account id survives a hyphenated name -----

#[tokio::test]
async fn oauth_account_id_sanitizes_hyphens() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;

    let (status, created) = call(
        router,
        "POST",
        "/api/v1/operations",
        Some(json!({
            "type": "oauth",
            "node_id": "node-1",
            "config": {"name": "test-free-net", "agent_type": "qwen-code"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let action_id = created["action_id"].as_str().unwrap();

    let (status, detail) = call(
        router,
        "PATCH",
        &format!("/api/v1/actions/{action_id}"),
        Some(json!({"status": "success", "result": {"ok": true}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["operation"]["status"], "completed");

    let (status, account) = call(router, "GET", "/api/v1/accounts/qwen-code_test_free_net", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["status"], "authenticated");
}

// --- seed scenario 4: a terminal Action rejects a second report -------

#[tokio::test]
async fn terminal_action_rejects_further_reports() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;

    let (_, created) = call(
        router,
        "POST",
        "/api/v1/operations",
        Some(json!({"type": "device_code", "node_id": "node-1", "config": {}})),
    )
    .await;
    let action_id = created["action_id"].as_str().unwrap();

    let (status, _) = call(
        router,
        "PATCH",
        &format!("/api/v1/actions/{action_id}"),
        Some(json!({"status": "failed", "error": "denied"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        call(router, "PATCH", &format!("/api/v1/actions/{action_id}"), Some(json!({"status": "running"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("terminal"));
}

// --- seed scenario 5: watchdog reclaims a Run its Node never started ---

#[tokio::test]
async fn watchdog_reclaims_never_started_run() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;

    let task = create_task(router, "long haul", "claude").await;
    let task_id = task["id"].as_str().unwrap().to_string();
    let (_, exec) = call(router, "POST", &format!("/api/v1/tasks/{task_id}/execute"), Some(json!({}))).await;
    let run_id = exec["run_id"].as_str().unwrap().to_string();
    assert_eq!(exec["status"], "assigned");

    // Node goes quiet; the run never reaches `running`. Advance the clock
    // past the stale threshold and drive the watchdog's own tick logic
    // directly against the harness's state.
    h.clock.advance(std::time::Duration::from_secs(600));
    let threshold_ms = Config::default().run_stale_threshold.as_millis() as u64;
    let older_than_ms = h.state.clock.epoch_ms().saturating_sub(threshold_ms);
    let reclaimed = h.state.store.reclaim_stale_runs(older_than_ms).unwrap();
    assert_eq!(reclaimed.len(), 1);

    let (status, run) = call(router, "GET", &format!("/api/v1/runs/{run_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "queued");
    assert!(run["node_id"].is_null());

    // The watchdog's post-reclaim dispatch pass picks it back up since the
    // node is still online.
    fleet_control::dispatch::assign_queued_runs(&h.state).unwrap();
    let (_, run_after) = call(router, "GET", &format!("/api/v1/runs/{run_id}"), None).await;
    assert_eq!(run_after["status"], "assigned");
}

// --- seed scenario 6: opening a terminal session closes the old one ----

#[test]
fn terminal_session_open_closes_prior_active_session() {
    use fleet_core::{InstanceId, NodeId, TerminalSession, TerminalSessionId, TerminalSessionStatus};
    use fleet_store::Store;

    let dir = tempfile::tempdir().unwrap();
    let store = EventSourcedStore::open(dir.path().join("term.wal")).unwrap();

    let first = TerminalSession::builder()
        .id(TerminalSessionId::from_string("term-1"))
        .instance_id(InstanceId::from_string("inst-1"))
        .node_id(NodeId::from_string("node-1"))
        .status(TerminalSessionStatus::Running)
        .build();
    store.put_terminal_session(first).unwrap();

    let second = TerminalSession::builder()
        .id(TerminalSessionId::from_string("term-2"))
        .instance_id(InstanceId::from_string("inst-1"))
        .node_id(NodeId::from_string("node-1"))
        .status(TerminalSessionStatus::Running)
        .build();
    let closed = store.open_terminal_session(second).unwrap();
    assert_eq!(closed, vec![TerminalSessionId::from_string("term-1")]);

    let first_after = store.get_terminal_session(&TerminalSessionId::from_string("term-1")).unwrap().unwrap();
    assert_eq!(first_after.status, TerminalSessionStatus::Closed);
}

// --- invariant: Run.node_id is null iff status = queued ----------------

#[tokio::test]
async fn run_node_id_invariant_holds_through_dispatch() {
    let h = harness();
    let router = &h.router;
    let task = create_task(router, "unassignable", "claude").await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // No node registered yet: the run stays queued with no node.
    let (_, exec) = call(router, "POST", &format!("/api/v1/tasks/{task_id}/execute"), Some(json!({}))).await;
    assert_eq!(exec["status"], "queued");
    let run_id = exec["run_id"].as_str().unwrap().to_string();
    let (_, run) = call(router, "GET", &format!("/api/v1/runs/{run_id}"), None).await;
    assert!(run["node_id"].is_null());

    register_node(router, "node-1", json!({})).await;
    // A fresh execute against the now-online node assigns inline.
    let (_, exec2) = call(router, "POST", &format!("/api/v1/tasks/{task_id}/execute"), Some(json!({}))).await;
    assert_eq!(exec2["status"], "assigned");
    let run_id2 = exec2["run_id"].as_str().unwrap().to_string();
    let (_, run2) = call(router, "GET", &format!("/api/v1/runs/{run_id2}"), None).await;
    assert!(!run2["node_id"].is_null());
}

// --- round-trip: duplicate event seq is silently dropped ---------------

#[tokio::test]
async fn duplicate_event_seq_is_dropped_not_duplicated() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;
    let task = create_task(router, "dup events", "claude").await;
    let task_id = task["id"].as_str().unwrap().to_string();
    let (_, exec) = call(router, "POST", &format!("/api/v1/tasks/{task_id}/execute"), Some(json!({}))).await;
    let run_id = exec["run_id"].as_str().unwrap().to_string();

    let batch = json!({"events": [{"seq": 1, "type": "run_started", "timestamp": 1, "payload": {}}]});
    call(router, "POST", &format!("/api/v1/runs/{run_id}/events"), Some(batch.clone())).await;
    call(router, "POST", &format!("/api/v1/runs/{run_id}/events"), Some(batch)).await;

    let (status, count) = call(router, "GET", &format!("/api/v1/runs/{run_id}/events/count"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 1);
}

// --- round-trip: repeated non-terminal Action reports are idempotent ---

#[tokio::test]
async fn repeated_progress_report_only_updates_progress_fields() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;
    let (_, created) = call(
        router,
        "POST",
        "/api/v1/operations",
        Some(json!({"type": "device_code", "node_id": "node-1", "config": {}})),
    )
    .await;
    let action_id = created["action_id"].as_str().unwrap();

    let (_, first) = call(
        router,
        "PATCH",
        &format!("/api/v1/actions/{action_id}"),
        Some(json!({"status": "running", "phase": "pulling_image", "progress": 10})),
    )
    .await;
    // `ActionDetailResponse` flattens the Action's own fields to the top
    // level, keeping only `operation` nested (§6).
    assert_eq!(first["status"], "running");

    let (status, second) = call(
        router,
        "PATCH",
        &format!("/api/v1/actions/{action_id}"),
        Some(json!({"status": "running", "phase": "pulling_image", "progress": 40})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "running");
    assert_eq!(second["progress"], 40);
    assert_eq!(second["created_at_ms"], first["created_at_ms"]);
}

// --- round-trip: duplicate Operations are allowed, not deduplicated -----

#[tokio::test]
async fn duplicate_operations_are_each_created_independently() {
    let h = harness();
    let router = &h.router;
    register_node(router, "node-1", json!({})).await;

    let req = json!({"type": "device_code", "node_id": "node-1", "config": {}});
    let (_, first) = call(router, "POST", "/api/v1/operations", Some(req.clone())).await;
    let (_, second) = call(router, "POST", "/api/v1/operations", Some(req)).await;
    assert_ne!(first["operation_id"], second["operation_id"]);

    let (status, page) = call(router, "GET", "/api/v1/operations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
}

// --- boundary: limit coercion and offset-beyond-total -------------------

#[tokio::test]
async fn list_tasks_limit_and_offset_boundaries() {
    let h = harness();
    let router = &h.router;
    for i in 0..3 {
        create_task(router, &format!("task-{i}"), "claude").await;
    }

    let (status, page) = call(router, "GET", "/api/v1/tasks?limit=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["limit"], 20);

    let (status, page) = call(router, "GET", "/api/v1/tasks?limit=500", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["limit"], 100);

    let (status, page) = call(router, "GET", "/api/v1/tasks?offset=500", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 0);
    assert_eq!(page["has_more"], false);
}

// --- invariant: Account.id derivation is stable and sanitized -----------

#[test]
fn account_id_formula_matches_spec() {
    let id = fleet_core::AccountId::from_parts("claude", "dev@example.com");
    assert_eq!(id.as_str(), "claude_dev_example_com");
}
