// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `CoordinationBus`, used by control-plane/executor tests and as
//! the degraded mode when `ETCD_ENDPOINTS` is unset — the system still
//! functions over pure HTTP polling without it, just without real-time fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, broadcast};
use tokio_util::sync::CancellationToken;

use crate::bus::{BusEvent, CoordinationBus};
use crate::error::BusError;
use crate::keys::{event_key, event_prefix, state_key};

#[derive(Default)]
struct Inner {
    heartbeats: BTreeMap<String, serde_json::Value>,
    events: BTreeMap<String, BusEvent>,
    state: BTreeMap<String, serde_json::Value>,
}

/// Backed by a plain `BTreeMap` so key order matches etcd's lexicographic
/// ordering without needing a real server.
pub struct MemoryBus {
    inner: Mutex<Inner>,
    publishes: broadcast::Sender<BusEvent>,
}

impl MemoryBus {
    pub fn new() -> Arc<Self> {
        let (publishes, _) = broadcast::channel(1024);
        Arc::new(Self { inner: Mutex::new(Inner::default()), publishes })
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        let (publishes, _) = broadcast::channel(1024);
        Self { inner: Mutex::new(Inner::default()), publishes }
    }
}

#[async_trait]
impl CoordinationBus for MemoryBus {
    async fn heartbeat(&self, node_id: &str, payload: serde_json::Value) -> Result<(), BusError> {
        self.inner.lock().heartbeats.insert(node_id.to_string(), payload);
        Ok(())
    }

    async fn publish_event(&self, event: BusEvent) -> Result<(), BusError> {
        let key = event_key(&event.workflow_type, &event.workflow_id, event.seq);
        self.inner.lock().events.insert(key, event.clone());
        let _ = self.publishes.send(event);
        Ok(())
    }

    async fn publish_event_with_state(
        &self,
        event: BusEvent,
        state: serde_json::Value,
    ) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        let key = event_key(&event.workflow_type, &event.workflow_id, event.seq);
        inner.events.insert(key, event.clone());
        inner.state.insert(state_key(&event.workflow_type, &event.workflow_id), state);
        drop(inner);
        let _ = self.publishes.send(event);
        Ok(())
    }

    async fn put_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        state: serde_json::Value,
    ) -> Result<(), BusError> {
        self.inner.lock().state.insert(state_key(workflow_type, workflow_id), state);
        Ok(())
    }

    async fn get_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
    ) -> Result<Option<serde_json::Value>, BusError> {
        Ok(self.inner.lock().state.get(&state_key(workflow_type, workflow_id)).cloned())
    }

    async fn next_seq(&self, workflow_type: &str, workflow_id: &str) -> Result<u64, BusError> {
        let prefix = event_prefix(workflow_type, workflow_id);
        let inner = self.inner.lock();
        let last = inner.events.range(prefix.clone()..).take_while(|(k, _)| k.starts_with(&prefix)).last();
        Ok(last.map(|(_, v)| v.seq + 1).unwrap_or(1))
    }

    async fn subscribe(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        after: u64,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<BusEvent>, BusError> {
        let prefix = event_prefix(workflow_type, workflow_id);
        let backlog: Vec<BusEvent> = {
            let inner = self.inner.lock();
            inner
                .events
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(_, v)| v.clone())
                .filter(|e| e.seq > after)
                .collect()
        };

        let (tx, rx) = mpsc::channel(64);
        let mut live = self.publishes.subscribe();
        let workflow_type = workflow_type.to_string();
        let workflow_id = workflow_id.to_string();

        tokio::spawn(async move {
            for event in backlog {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    received = live.recv() => {
                        match received {
                            Ok(event) => {
                                if event.workflow_type == workflow_type && event.workflow_id == workflow_id
                                    && event.seq > after
                                    && tx.send(event).await.is_err()
                                {
                                    return;
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => return,
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn next_seq_starts_at_one_and_increments() {
        let bus = MemoryBus::new();
        assert_eq!(bus.next_seq("run", "run-1").await.unwrap(), 1);
        bus.publish_event(BusEvent {
            workflow_type: "run".into(),
            workflow_id: "run-1".into(),
            seq: 1,
            payload: serde_json::json!({}),
        })
        .await
        .unwrap();
        assert_eq!(bus.next_seq("run", "run-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn subscribe_replays_backlog_then_live_events_in_order() {
        let bus = MemoryBus::new();
        for seq in 1..=3 {
            bus.publish_event(BusEvent {
                workflow_type: "run".into(),
                workflow_id: "run-1".into(),
                seq,
                payload: serde_json::json!({ "seq": seq }),
            })
            .await
            .unwrap();
        }

        let cancel = CancellationToken::new();
        let mut rx = bus.subscribe("run", "run-1", 0, cancel.clone()).await.unwrap();

        for expected in 1..=3 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.seq, expected);
        }

        bus.publish_event(BusEvent {
            workflow_type: "run".into(),
            workflow_id: "run-1".into(),
            seq: 4,
            payload: serde_json::json!({ "seq": 4 }),
        })
        .await
        .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.seq, 4);

        cancel.cancel();
    }

    #[tokio::test]
    async fn publish_event_with_state_is_atomic_from_a_readers_perspective() {
        let bus = MemoryBus::new();
        bus.publish_event_with_state(
            BusEvent { workflow_type: "run".into(), workflow_id: "run-1".into(), seq: 1, payload: serde_json::json!({}) },
            serde_json::json!({ "status": "running" }),
        )
        .await
        .unwrap();
        let state = bus.get_state("run", "run-1").await.unwrap().unwrap();
        assert_eq!(state["status"], "running");
    }
}
