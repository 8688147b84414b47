// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Four cooperative loops under a single cancellation root (§4.6).

mod auth_loop;
mod heartbeat;
mod instance_loop;
mod run_loop;
mod terminal_loop;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::ControlClient;
use crate::config::Config;
use crate::drivers::DriverRegistry;

/// Work in flight on this node, keyed by Run or Action id, so the poll loops
/// can skip work already being driven and the heartbeat can report
/// `available = max_concurrent - len(running)`.
pub type RunningMap = Arc<Mutex<HashMap<String, CancellationToken>>>;

#[derive(Clone)]
pub struct Runtime {
    pub config: Arc<Config>,
    pub client: Arc<ControlClient>,
    pub drivers: Arc<DriverRegistry>,
    pub running: RunningMap,
    pub active_terminal: Arc<Mutex<Option<String>>>,
}

impl Runtime {
    pub fn new(config: Config, client: ControlClient, drivers: DriverRegistry) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            drivers: Arc::new(drivers),
            running: Arc::new(Mutex::new(HashMap::new())),
            active_terminal: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn all four loops under `root`; returns once every loop has been
    /// scheduled (the loops themselves run until `root` is cancelled).
    pub fn spawn_all(&self, root: CancellationToken) {
        tokio::spawn(heartbeat::run(self.clone(), root.clone()));
        tokio::spawn(run_loop::run(self.clone(), root.clone()));
        tokio::spawn(auth_loop::run(self.clone(), root.clone()));
        tokio::spawn(instance_loop::run(self.clone(), root.clone()));
        tokio::spawn(terminal_loop::run(self.clone(), root));
    }
}

/// Detached clone of a client/config pair used by status callbacks so a
/// terminal report still lands after the originating worker's scope is
/// cancelled (§4.6).
pub(crate) fn detached_context(runtime: &Runtime) -> (Arc<ControlClient>, CancellationToken) {
    let token = CancellationToken::new();
    let deadline = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        deadline.cancel();
    });
    (runtime.client.clone(), token)
}
