// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination-bus boundary error type (§7).

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("etcd error: {0}")]
    Etcd(#[from] etcd_client::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("bus key not found: {0}")]
    NotFound(String),

    #[error("bus is unconfigured (no ETCD_ENDPOINTS); {0} is unavailable")]
    Unconfigured(&'static str),
}
