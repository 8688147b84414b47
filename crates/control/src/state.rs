// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state, injected into every handler via axum's `State`
//! extractor (§4.2) — mirrors how the teacher's runtime threads its
//! adapters through one generic `ListenCtx`.

use std::sync::Arc;

use fleet_bus::CoordinationBus;
use fleet_core::{Clock, SystemClock};
use fleet_store::Store;

use crate::config::Config;

/// Object-safe sliver of [`Clock`] the HTTP layer needs: wall-clock
/// timestamps for records it writes. `Clock` itself is not object-safe
/// (its `Clone` supertrait), so handlers depend on this instead.
pub trait EpochClock: Send + Sync {
    fn epoch_ms(&self) -> u64;
}

impl<C: Clock> EpochClock for C {
    fn epoch_ms(&self) -> u64 {
        Clock::epoch_ms(self)
    }
}

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub bus: Option<Arc<dyn CoordinationBus>>,
    pub clock: Arc<dyn EpochClock>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, bus: Option<Arc<dyn CoordinationBus>>, config: Config) -> Self {
        Self { store, bus, clock: Arc::new(SystemClock), config }
    }

    pub fn with_clock(
        store: Arc<dyn Store>,
        bus: Option<Arc<dyn CoordinationBus>>,
        config: Config,
        clock: Arc<dyn EpochClock>,
    ) -> Self {
        Self { store, bus, clock, config }
    }
}

pub type SharedState = Arc<AppState>;
