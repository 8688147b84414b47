// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance loop: ticks every 3s, starts the Docker container for each
//! `pending` Instance assigned to this node (§4.6).

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::container;
use crate::runtime::Runtime;

const TICK: Duration = Duration::from_secs(3);

pub async fn run(runtime: Runtime, root: CancellationToken) {
    loop {
        tokio::select! {
            _ = root.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }

        let instances = match runtime.client.pending_instances_for_node(&runtime.config.node_id).await {
            Ok(instances) => instances,
            Err(err) => {
                tracing::warn!(target: "executor", error = %err, "[instances] poll failed");
                continue;
            }
        };

        for instance in instances {
            let instance_id = instance.id.to_string();
            let already_running = runtime.running.lock().contains_key(&instance_id);
            if already_running {
                continue;
            }

            let token = root.child_token();
            runtime.running.lock().insert(instance_id.clone(), token.clone());

            let worker_runtime = runtime.clone();
            tokio::spawn(async move {
                start_instance(worker_runtime.clone(), instance, token).await;
                worker_runtime.running.lock().remove(&instance_id);
            });
        }
    }
}

async fn start_instance(runtime: Runtime, instance: fleet_core::Instance, token: CancellationToken) {
    if token.is_cancelled() {
        return;
    }

    let account = match runtime.client.get_account(instance.account_id.as_str()).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::error!(target: "executor", instance_id = %instance.id, "[instances] account not found");
            return;
        }
        Err(err) => {
            tracing::error!(target: "executor", instance_id = %instance.id, error = %err, "[instances] account lookup failed");
            return;
        }
    };

    let image = std::env::var("FLEET_AGENT_IMAGE").unwrap_or_else(|_| format!("fleet-agent-{}", instance.agent_type));
    let workspace_dir = runtime.config.workspace_dir.join(instance.id.suffix());

    if let Err(err) =
        container::start_instance_container(&instance.container_name, &image, &account.volume_name, &workspace_dir)
            .await
    {
        tracing::error!(target: "executor", instance_id = %instance.id, error = %err, "[instances] container start failed");
        return;
    }

    if let Err(err) = runtime.client.patch_instance_running(instance.id.as_str()).await {
        tracing::error!(target: "executor", instance_id = %instance.id, error = %err, "[instances] failed to report running");
    }
}
