// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run loop: ticks every 5s, fetches assigned Runs for this node, launches a
//! worker per not-yet-running Run (§4.6).

use std::time::Duration;

use fleet_wire::request::{AppendEventsRequest, EventWire, PatchRunRequest};
use tokio_util::sync::CancellationToken;

use crate::container;
use crate::runtime::Runtime;

const TICK: Duration = Duration::from_secs(5);

pub async fn run(runtime: Runtime, root: CancellationToken) {
    loop {
        tokio::select! {
            _ = root.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }

        let runs = match runtime.client.runs_for_node(&runtime.config.node_id).await {
            Ok(runs) => runs,
            Err(err) => {
                tracing::warn!(target: "executor", error = %err, "[runs] poll failed");
                continue;
            }
        };

        for run in runs {
            let run_id = run.run.id.to_string();
            let already_running = runtime.running.lock().contains_key(&run_id);
            if already_running {
                continue;
            }
            if runtime.running.lock().len() >= runtime.config.max_concurrent_runs {
                continue;
            }

            let token = root.child_token();
            runtime.running.lock().insert(run_id.clone(), token.clone());

            let worker_runtime = runtime.clone();
            let worker_run = run.run;
            tokio::spawn(async move {
                drive_run(worker_runtime.clone(), worker_run, token).await;
                worker_runtime.running.lock().remove(&run_id);
            });
        }
    }
}

async fn drive_run(runtime: Runtime, run: fleet_core::Run, token: CancellationToken) {
    let run_id = run.id.to_string();
    let spec = &run.snapshot.task_spec;

    let driver = match runtime.drivers.get(&spec.agent_type) {
        Ok(d) => d,
        Err(err) => {
            report_failure(&runtime, &run_id, err.to_string()).await;
            return;
        }
    };
    if let Err(err) = driver.validate(spec) {
        report_failure(&runtime, &run_id, err.to_string()).await;
        return;
    }

    let instance_id = spec.labels.get("instance_id").map(String::as_str);
    let account_id = spec.labels.get("account_id").map(String::as_str);
    let container_name = match container::resolve_container_name(&runtime.client, instance_id, account_id).await {
        Ok(name) => name,
        Err(err) => {
            report_failure(&runtime, &run_id, err.to_string()).await;
            return;
        }
    };

    let patch = PatchRunRequest { status: fleet_core::RunStatus::Running, error: None };
    if let Err(err) = runtime.client.patch_run(&run_id, &patch).await {
        tracing::warn!(target: "executor", run_id = %run_id, error = %err, "[dispatch] could not report running");
    }

    let command = driver.build_command(spec, &run.snapshot.agent_config);
    let mut seq = 1u64;
    let mut batch = Vec::new();

    let result = tokio::select! {
        _ = token.cancelled() => {
            report_failure(&runtime, &run_id, "cancelled".to_string()).await;
            return;
        }
        result = container::exec_streaming(&container_name, &command, |line| {
            if let Some(parsed) = driver.parse_event(line) {
                seq += 1;
                batch.push(EventWire {
                    seq,
                    event_type: parsed.event_type,
                    timestamp: 0,
                    payload: parsed.payload,
                    raw: Some(line.to_string()),
                });
            }
        }) => result,
    };

    if !batch.is_empty() {
        if let Err(err) = runtime.client.append_run_events(&run_id, &AppendEventsRequest { events: batch }).await {
            tracing::warn!(target: "executor", run_id = %run_id, error = %err, "[dispatch] event batch rejected");
        }
    }

    match result {
        Ok(status) if status.success() => {
            let patch = PatchRunRequest { status: fleet_core::RunStatus::Done, error: None };
            let _ = runtime.client.patch_run(&run_id, &patch).await;
        }
        Ok(status) => {
            report_failure(&runtime, &run_id, format!("driver exited with {status}")).await;
        }
        Err(err) => {
            report_failure(&runtime, &run_id, err.to_string()).await;
        }
    }
}

/// Report a terminal failure using a detached context (fresh 10s deadline)
/// so the report survives cancellation of the originating worker scope.
async fn report_failure(runtime: &Runtime, run_id: &str, error: String) {
    let (client, _deadline) = crate::runtime::detached_context(runtime);
    let patch = PatchRunRequest { status: fleet_core::RunStatus::Failed, error: Some(error.clone()) };
    if let Err(err) = client.patch_run(run_id, &patch).await {
        tracing::error!(target: "executor", run_id = %run_id, original_error = %error, report_error = %err, "[dispatch] failed to report run failure");
    }
}
