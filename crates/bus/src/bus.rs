// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination-bus abstraction (§4.7): an ordered key/value store with
//! TTL leases and prefix watches. The persistent store remains the system
//! of record; this layer exists purely for fan-out and crash-consistent
//! ordering to real-time subscribers.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::BusError;

/// One published event, already assigned a `seq` by its producer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BusEvent {
    pub workflow_type: String,
    pub workflow_id: String,
    pub seq: u64,
    pub payload: serde_json::Value,
}

/// TTL applied to a node's liveness record (§4.7): expiry marks it offline.
pub const HEARTBEAT_LEASE_SECS: i64 = 30;

/// TTL applied to a published event record.
pub const EVENT_LEASE_SECS: i64 = 24 * 60 * 60;

#[async_trait]
pub trait CoordinationBus: Send + Sync {
    /// Refresh (or create) a node's leased liveness record.
    async fn heartbeat(&self, node_id: &str, payload: serde_json::Value) -> Result<(), BusError>;

    /// Publish one event under its leased per-event key.
    async fn publish_event(&self, event: BusEvent) -> Result<(), BusError>;

    /// Publish an event and overwrite the workflow's latest-state singleton
    /// atomically, so subscribers never observe the event without the state
    /// that produced it, or vice versa.
    async fn publish_event_with_state(
        &self,
        event: BusEvent,
        state: serde_json::Value,
    ) -> Result<(), BusError>;

    /// Overwrite the latest-state singleton for a workflow (no lease).
    async fn put_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        state: serde_json::Value,
    ) -> Result<(), BusError>;

    async fn get_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
    ) -> Result<Option<serde_json::Value>, BusError>;

    /// Allocate the next sequence number for a workflow's event log, via the
    /// last-key-descending read trick (§4.7): race-tolerant only under the
    /// single-producer-per-workflow assumption that holds here.
    async fn next_seq(&self, workflow_type: &str, workflow_id: &str) -> Result<u64, BusError>;

    /// Range-scan existing events with `seq > after`, then watch the same
    /// prefix for new ones, merging both into one ascending stream. Closes
    /// when `cancel` fires.
    async fn subscribe(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        after: u64,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<BusEvent>, BusError>;
}
