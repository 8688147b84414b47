// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor-side error types, one `thiserror` enum per concern, matching
//! the daemon crate's per-module error style.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("control-plane request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("control plane returned {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no driver registered for agent type {0:?}")]
    Unknown(String),
    #[error("invalid task spec: {0}")]
    InvalidSpec(String),
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("docker exec failed: {0}")]
    ExecFailed(String),
    #[error("no container resolved for run")]
    NoContainer,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
