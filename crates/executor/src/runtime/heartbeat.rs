// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat loop: ticks every 10s, reports this node alive with its
//! current spare capacity (§4.6).

use std::time::Duration;

use fleet_wire::request::NodeHeartbeatRequest;
use tokio_util::sync::CancellationToken;

use crate::runtime::Runtime;

const TICK: Duration = Duration::from_secs(10);

pub async fn run(runtime: Runtime, root: CancellationToken) {
    loop {
        let available = runtime.config.max_concurrent_runs.saturating_sub(runtime.running.lock().len());
        let req = NodeHeartbeatRequest {
            node_id: fleet_core::NodeId::from_string(&runtime.config.node_id),
            hostname: hostname(),
            ips: Vec::new(),
            labels: Default::default(),
            capacity: [("available".to_string(), available as i64)].into_iter().collect(),
        };

        if let Err(err) = runtime.client.heartbeat(&req).await {
            tracing::warn!(target: "executor", error = %err, "[heartbeat] control plane unreachable");
        }

        tokio::select! {
            _ = root.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}
