// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal loop: ticks every 3s. Only one TerminalSession may be active on
//! a node at a time; starting a new one first closes the currently-active
//! ttyd container under lock (§4.6, §8 seed scenario 6).

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::container;
use crate::runtime::Runtime;

const TICK: Duration = Duration::from_secs(3);
const TTYD_BASE_PORT: u16 = 7681;

pub async fn run(runtime: Runtime, root: CancellationToken) {
    loop {
        tokio::select! {
            _ = root.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }

        let sessions = match runtime.client.terminal_sessions_for_node(&runtime.config.node_id).await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(target: "executor", error = %err, "[terminal] poll failed");
                continue;
            }
        };

        let pending = sessions
            .iter()
            .find(|s| s.status == fleet_core::TerminalSessionStatus::Pending)
            .cloned();
        let Some(session) = pending else { continue };

        let current = runtime.active_terminal.lock().clone();
        if let Some(current_id) = current {
            if current_id != session.id.to_string() {
                if let Err(err) = runtime.client.patch_terminal_session_closed(&current_id).await {
                    tracing::warn!(target: "executor", session_id = %current_id, error = %err, "[terminal] close failed");
                }
                let _ = container::remove_container(&format!("fleet-ttyd-{current_id}")).await;
            }
        }

        let session_id = session.id.to_string();
        *runtime.active_terminal.lock() = Some(session_id.clone());

        match start_ttyd(&session_id, &session.container_name).await {
            Ok(port) => {
                let url = format!("http://{}:{}/", runtime.config.node_id, port);
                if let Err(err) = runtime.client.patch_terminal_session_running(&session_id, port, &url).await {
                    tracing::error!(target: "executor", session_id = %session_id, error = %err, "[terminal] failed to report running");
                }
            }
            Err(err) => {
                tracing::error!(target: "executor", session_id = %session_id, error = %err, "[terminal] ttyd start failed");
            }
        }
    }
}

async fn start_ttyd(session_id: &str, container_name: &str) -> Result<u16, crate::error::ContainerError> {
    let port = TTYD_BASE_PORT;
    let port_mapping = format!("{port}:{TTYD_BASE_PORT}");
    let name = format!("fleet-ttyd-{session_id}");
    let target = format!("container:{container_name}");
    tokio::process::Command::new("docker")
        .args(["run", "-d", "--name", &name, "--net", &target, "-p", &port_mapping, "tsl0922/ttyd", "ttyd", "bash"])
        .output()
        .await
        .map_err(crate::error::ContainerError::Io)?;
    Ok(port)
}
