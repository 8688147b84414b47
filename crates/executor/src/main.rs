// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fleet_executor::drivers::DriverRegistry;
use fleet_executor::{Config, ControlClient, Runtime};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.workspace_dir)?;

    tracing::info!(
        target: "executor",
        node_id = %config.node_id,
        api_server_url = %config.api_server_url,
        max_concurrent_runs = config.max_concurrent_runs,
        "[executor] starting"
    );

    let client = ControlClient::new(config.api_server_url.clone());
    let drivers = DriverRegistry::with_reference_drivers();
    let runtime = Runtime::new(config, client, drivers);

    let root = CancellationToken::new();
    runtime.spawn_all(root.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "executor", "[executor] shutting down");
    root.cancel();
    // Give in-flight detached status callbacks (10s deadline, §4.6) a chance
    // to land before the process exits.
    tokio::time::sleep(std::time::Duration::from_secs(11)).await;

    Ok(())
}
