// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy: an outbound HTTP/TCP endpoint registered for connectivity testing.
//!
//! Proxies are a flat, unordered registry with one `is_default` flag; they
//! carry no state machine of their own (unlike Task/Run/Operation) — the
//! only behaviour worth modelling is the default-toggle invariant.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a registered proxy.
    pub struct ProxyId("proxy-");
}

/// A registered outbound proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
    pub id: ProxyId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Proxy {
    pub fn new(id: ProxyId, name: String, url: String, is_default: bool, now_ms: u64) -> Self {
        Self { id, name, url, is_default, created_at_ms: now_ms, updated_at_ms: now_ms }
    }
}

crate::builder! {
    pub struct ProxyBuilder => Proxy {
        into {
            id: ProxyId = ProxyId::from_string("proxy-test"),
            name: String = "test-proxy".to_string(),
            url: String = "http://127.0.0.1:8080".to_string(),
        }
        set {
            is_default: bool = false,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
    }
}
