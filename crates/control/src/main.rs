// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetd-control`: the control-plane binary — REST surface, dispatch,
//! and the stale-run watchdog.

use std::sync::Arc;

use fleet_bus::{CoordinationBus, EtcdBus, MemoryBus};
use fleet_control::{http, logging, watchdog, AppState, Config};
use fleet_store::EventSourcedStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _logging_guard = logging::init(config.log_dir.as_deref());

    let data_dir = config.resolve_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let store = EventSourcedStore::open(data_dir.join("control.wal"))?;

    let bus: Option<Arc<dyn CoordinationBus>> = if config.etcd_endpoints.is_empty() {
        tracing::info!(target: "control", "[bus] ETCD_ENDPOINTS unset, using in-process bus");
        Some(MemoryBus::new() as Arc<dyn CoordinationBus>)
    } else {
        tracing::info!(target: "control", endpoints = ?config.etcd_endpoints, "[bus] connecting to etcd");
        Some(Arc::new(EtcdBus::connect(&config.etcd_endpoints).await?))
    };

    let watchdog_interval = config.watchdog_interval;
    let run_stale_threshold = config.run_stale_threshold;
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState::new(store, bus, config));

    tokio::spawn(watchdog::run(state.clone(), watchdog_interval, run_stale_threshold));

    let router = http::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(target: "control", addr = %bind_addr, "[control] listening");
    axum::serve(listener, router).await?;
    Ok(())
}
