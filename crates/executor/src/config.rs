// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor configuration from environment variables (§4.11).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node_id: String,
    pub api_server_url: String,
    pub workspace_dir: PathBuf,
    pub etcd_endpoints: Vec<String>,
    pub max_concurrent_runs: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let node_id = std::env::var("NODE_ID").map_err(|_| ConfigError::Missing("NODE_ID"))?;
        let api_server_url =
            std::env::var("API_SERVER_URL").map_err(|_| ConfigError::Missing("API_SERVER_URL"))?;
        let workspace_dir = std::env::var("WORKSPACE_DIR")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("WORKSPACE_DIR"))?;
        let etcd_endpoints = std::env::var("ETCD_ENDPOINTS")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let max_concurrent_runs = match std::env::var("FLEET_MAX_CONCURRENT_RUNS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid { var: "FLEET_MAX_CONCURRENT_RUNS", value: v })?,
            Err(_) => 4,
        };

        Ok(Self { node_id, api_server_url, workspace_dir, etcd_endpoints, max_concurrent_runs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_node_id_is_an_error() {
        // SAFETY-equivalent: env var mutation is test-only and single-threaded here.
        std::env::remove_var("NODE_ID");
        std::env::remove_var("API_SERVER_URL");
        std::env::remove_var("WORKSPACE_DIR");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("NODE_ID")));
    }
}
