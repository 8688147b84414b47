// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `etcd-client`-backed `CoordinationBus`, the production implementation.

use async_trait::async_trait;
use etcd_client::{Client, GetOptions, PutOptions, Txn, TxnOp, WatchOptions};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::{BusEvent, CoordinationBus, EVENT_LEASE_SECS, HEARTBEAT_LEASE_SECS};
use crate::error::BusError;
use crate::keys::{event_key, event_prefix, node_heartbeat_key, state_key};

pub struct EtcdBus {
    client: Mutex<Client>,
}

impl EtcdBus {
    pub async fn connect(endpoints: &[String]) -> Result<Self, BusError> {
        let client = Client::connect(endpoints, None).await?;
        Ok(Self { client: Mutex::new(client) })
    }

    async fn lease_for(&self, ttl_secs: i64) -> Result<i64, BusError> {
        let mut client = self.client.lock().clone();
        let lease = client.lease_grant(ttl_secs, None).await?;
        Ok(lease.id())
    }
}

#[async_trait]
impl CoordinationBus for EtcdBus {
    async fn heartbeat(&self, node_id: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let lease_id = self.lease_for(HEARTBEAT_LEASE_SECS).await?;
        let value = serde_json::to_vec(&payload)?;
        let mut client = self.client.lock().clone();
        client
            .put(node_heartbeat_key(node_id), value, Some(PutOptions::new().with_lease(lease_id)))
            .await?;
        Ok(())
    }

    async fn publish_event(&self, event: BusEvent) -> Result<(), BusError> {
        let lease_id = self.lease_for(EVENT_LEASE_SECS).await?;
        let key = event_key(&event.workflow_type, &event.workflow_id, event.seq);
        let value = serde_json::to_vec(&event)?;
        let mut client = self.client.lock().clone();
        client.put(key, value, Some(PutOptions::new().with_lease(lease_id))).await?;
        Ok(())
    }

    async fn publish_event_with_state(
        &self,
        event: BusEvent,
        state: serde_json::Value,
    ) -> Result<(), BusError> {
        let lease_id = self.lease_for(EVENT_LEASE_SECS).await?;
        let event_key = event_key(&event.workflow_type, &event.workflow_id, event.seq);
        let state_key = state_key(&event.workflow_type, &event.workflow_id);
        let event_value = serde_json::to_vec(&event)?;
        let state_value = serde_json::to_vec(&state)?;

        let txn = Txn::new().and_then([
            TxnOp::put(event_key, event_value, Some(PutOptions::new().with_lease(lease_id))),
            TxnOp::put(state_key, state_value, None),
        ]);
        let mut client = self.client.lock().clone();
        client.txn(txn).await?;
        Ok(())
    }

    async fn put_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        state: serde_json::Value,
    ) -> Result<(), BusError> {
        let value = serde_json::to_vec(&state)?;
        let mut client = self.client.lock().clone();
        client.put(state_key(workflow_type, workflow_id), value, None).await?;
        Ok(())
    }

    async fn get_state(
        &self,
        workflow_type: &str,
        workflow_id: &str,
    ) -> Result<Option<serde_json::Value>, BusError> {
        let mut client = self.client.lock().clone();
        let resp = client.get(state_key(workflow_type, workflow_id), None).await?;
        match resp.kvs().first() {
            Some(kv) => Ok(Some(serde_json::from_slice(kv.value())?)),
            None => Ok(None),
        }
    }

    /// Last-key-descending read trick (§4.7): fetch the one key with the
    /// highest suffix under the workflow's event prefix and parse its `seq`.
    /// Race-tolerant only because one executor owns one Run.
    async fn next_seq(&self, workflow_type: &str, workflow_id: &str) -> Result<u64, BusError> {
        let prefix = event_prefix(workflow_type, workflow_id);
        let mut client = self.client.lock().clone();
        let resp = client
            .get(prefix, Some(GetOptions::new().with_prefix().with_sort(
                etcd_client::SortTarget::Key,
                etcd_client::SortOrder::Descend,
            ).with_limit(1)))
            .await?;
        match resp.kvs().first() {
            Some(kv) => {
                let event: BusEvent = serde_json::from_slice(kv.value())?;
                Ok(event.seq + 1)
            }
            None => Ok(1),
        }
    }

    async fn subscribe(
        &self,
        workflow_type: &str,
        workflow_id: &str,
        after: u64,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<BusEvent>, BusError> {
        let prefix = event_prefix(workflow_type, workflow_id);
        let mut client = self.client.lock().clone();

        let backlog_resp = client
            .get(prefix.clone(), Some(GetOptions::new().with_prefix().with_sort(
                etcd_client::SortTarget::Key,
                etcd_client::SortOrder::Ascend,
            )))
            .await?;
        let mut backlog = Vec::new();
        for kv in backlog_resp.kvs() {
            let event: BusEvent = serde_json::from_slice(kv.value())?;
            if event.seq > after {
                backlog.push(event);
            }
        }

        let (watcher, mut stream) =
            client.watch(prefix, Some(WatchOptions::new().with_prefix())).await?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let _watcher = watcher;
            for event in backlog {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    next = stream.message() => {
                        let Ok(Some(resp)) = next else { return };
                        for put_event in resp.events() {
                            let Some(kv) = put_event.kv() else { continue };
                            let Ok(event) = serde_json::from_slice::<BusEvent>(kv.value()) else { continue };
                            if event.seq > after && tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}
