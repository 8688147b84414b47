// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The queued-too-long watchdog (§4.3): a background tokio task, ticking on
//! a configurable interval, in the same ticker idiom the executor's own
//! poll loops use. Also re-runs assignment, so a Run queued before any
//! matching node came online eventually gets picked up.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::dispatch::assign_queued_runs;
use crate::state::AppState;

pub async fn run(state: Arc<AppState>, interval: Duration, stale_threshold: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let older_than_ms = state.clock.epoch_ms().saturating_sub(stale_threshold.as_millis() as u64);
        match state.store.reclaim_stale_runs(older_than_ms) {
            Ok(reclaimed) if !reclaimed.is_empty() => {
                info!(target: "control", count = reclaimed.len(), "[watchdog] reclaimed stale runs");
            }
            Ok(_) => {}
            Err(err) => warn!(target: "control", error = %err, "[watchdog] reclaim_stale_runs failed"),
        }

        match assign_queued_runs(&state) {
            Ok(assigned) if assigned > 0 => {
                info!(target: "control", count = assigned, "[dispatch] assigned queued runs on tick");
            }
            Ok(_) => {}
            Err(err) => warn!(target: "control", error = %err, "[dispatch] assign_queued_runs failed"),
        }
    }
}
