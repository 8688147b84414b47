// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker-CLI-backed container runtime: resolves a Run's target container
//! and streams its driver output line by line (§4.6).

use std::io::BufRead;

use fleet_core::sanitize_account_name;

use crate::client::ControlClient;
use crate::error::ContainerError;

/// Run a docker CLI command and return stdout on success.
async fn run_docker(args: &[&str]) -> Result<String, ContainerError> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(ContainerError::Io)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ContainerError::ExecFailed(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim())))
    }
}

/// Resolve the container name a Run should execute in, in dispatch order:
/// `instance_id` → API lookup; `account_id` → API search; local name pattern
/// match on the sanitised account id (§4.6).
pub async fn resolve_container_name(
    client: &ControlClient,
    instance_id: Option<&str>,
    account_id: Option<&str>,
) -> Result<String, ContainerError> {
    if let Some(instance_id) = instance_id {
        if let Some(instance) = client.get_instance(instance_id).await.map_err(|e| ContainerError::ExecFailed(e.to_string()))? {
            return Ok(instance.container_name);
        }
    }

    if let Some(account_id) = account_id {
        let instances = client
            .instances_for_account(account_id)
            .await
            .map_err(|e| ContainerError::ExecFailed(e.to_string()))?;
        if let Some(instance) = instances.into_iter().find(|i| i.status == fleet_core::InstanceStatus::Running) {
            return Ok(instance.container_name);
        }

        let pattern = format!("fleet-acct-{}", sanitize_account_name(account_id));
        let listed = run_docker(&["ps", "--format", "{{.Names}}"]).await?;
        if let Some(name) = listed.lines().find(|name| name.contains(&pattern)) {
            return Ok(name.to_string());
        }
    }

    Err(ContainerError::NoContainer)
}

/// Execute `command` inside `container_name` via `docker exec`, invoking
/// `on_line` for every line of combined stdout as it arrives. Uses a 1 MiB
/// scanner buffer per line, matching the spec's bound on pathologically long
/// driver output lines.
pub async fn exec_streaming(
    container_name: &str,
    command: &str,
    mut on_line: impl FnMut(&str),
) -> Result<std::process::ExitStatus, ContainerError> {
    use tokio::io::AsyncBufReadExt;

    let mut child = tokio::process::Command::new("docker")
        .args(["exec", container_name, "bash", "-lc", command])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(ContainerError::Io)?;

    let stdout = child.stdout.take().ok_or(ContainerError::NoContainer)?;
    let mut reader = tokio::io::BufReader::with_capacity(1024 * 1024, stdout).lines();

    while let Some(line) = reader.next_line().await.map_err(ContainerError::Io)? {
        on_line(&line);
    }

    let status = child.wait().await.map_err(ContainerError::Io)?;
    Ok(status)
}

/// Start a Docker container for a newly-created Instance, mounting the
/// Account's credential volume and the node-local workspace dir.
pub async fn start_instance_container(
    container_name: &str,
    image: &str,
    volume_name: &str,
    workspace_dir: &std::path::Path,
) -> Result<(), ContainerError> {
    let vol_mount = format!("{}:/credentials", volume_name);
    let workspace_mount = format!("{}:/workspace", workspace_dir.display());
    run_docker(&[
        "run",
        "-d",
        "--name",
        container_name,
        "-v",
        &vol_mount,
        "-v",
        &workspace_mount,
        "-w",
        "/workspace",
        image,
        "sleep",
        "infinity",
    ])
    .await?;
    Ok(())
}

/// Force-remove a container by name, ignoring "already gone" errors. Used
/// to tear down the previous ttyd sidecar when a new TerminalSession starts.
pub async fn remove_container(name: &str) -> Result<(), ContainerError> {
    run_docker(&["rm", "-f", name]).await.map(|_| ())
}

/// Read back non-empty, well-formed lines from a buffer — a small helper
/// exercised directly in tests without spawning a real `docker` process.
pub fn parse_lines(buf: &[u8]) -> Vec<String> {
    buf.lines().map_while(Result::ok).filter(|l| !l.is_empty()).collect()
}
