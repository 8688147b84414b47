// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy registry projection: a flat, unordered map with a default toggle.

use fleet_core::{Proxy, ProxyId};

use super::MaterializedState;

pub(super) fn apply_put(state: &mut MaterializedState, proxy: &Proxy) {
    state.proxies.insert(proxy.id, proxy.clone());
}

pub(super) fn apply_deleted(state: &mut MaterializedState, proxy_id: &str) {
    state.proxies.remove(proxy_id);
}

impl MaterializedState {
    pub fn get_proxy(&self, id: &ProxyId) -> Option<&Proxy> {
        self.proxies.get(id)
    }

    pub fn list_proxies(&self) -> Vec<&Proxy> {
        let mut proxies: Vec<&Proxy> = self.proxies.values().collect();
        proxies.sort_by_key(|p| p.created_at_ms);
        proxies
    }
}
