// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane configuration, assembled from environment variables with
//! plain `std::env` parsing (§4.11) — no config-file parser, matching the
//! teacher's `env.rs`.

use std::path::PathBuf;
use std::time::Duration;

/// Fatal startup failure: a required variable is absent or unparseable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("cannot resolve a state directory: set FLEET_DATA_DIR, XDG_STATE_HOME, or HOME")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: Option<String>,
    pub log_dir: Option<String>,
    pub watchdog_interval: Duration,
    pub run_stale_threshold: Duration,
    pub etcd_endpoints: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7080".to_string(),
            data_dir: None,
            log_dir: None,
            watchdog_interval: Duration::from_secs(30),
            run_stale_threshold: Duration::from_secs(300),
            etcd_endpoints: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("FLEET_BIND_ADDR") {
            config.bind_addr = v;
        }
        config.data_dir = std::env::var("FLEET_DATA_DIR").ok();
        config.log_dir = std::env::var("FLEET_LOG_DIR").ok();
        if let Ok(v) = std::env::var("FLEET_WATCHDOG_INTERVAL_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "FLEET_WATCHDOG_INTERVAL_SECS", value: v })?;
            config.watchdog_interval = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("FLEET_RUN_STALE_THRESHOLD_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "FLEET_RUN_STALE_THRESHOLD_SECS", value: v })?;
            config.run_stale_threshold = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("ETCD_ENDPOINTS") {
            config.etcd_endpoints = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        Ok(config)
    }

    /// Resolve the WAL/state directory: `FLEET_DATA_DIR` > `XDG_STATE_HOME/fleet`
    /// > `~/.local/state/fleet`, in the daemon's `state_dir()` idiom.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(PathBuf::from(dir));
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return Ok(PathBuf::from(xdg).join("fleet"));
        }
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoDataDir)?;
        Ok(PathBuf::from(home).join(".local/state/fleet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_fallbacks() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:7080");
        assert_eq!(config.watchdog_interval, Duration::from_secs(30));
        assert_eq!(config.run_stale_threshold, Duration::from_secs(300));
        assert!(config.etcd_endpoints.is_empty());
    }
}
