// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin REST client for the control plane, used by every poll loop.

use fleet_core::{Account, Instance, TerminalSession};
use fleet_wire::request::{AppendEventsRequest, NodeHeartbeatRequest, PatchActionRequest, PatchRunRequest};
use fleet_wire::response::{ActionDetailResponse, NodeHeartbeatResponse, RunResponse};

use crate::error::ClientError;

#[derive(Clone)]
pub struct ControlClient {
    http: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::Api { status, body })
        }
    }

    pub async fn heartbeat(&self, req: &NodeHeartbeatRequest) -> Result<NodeHeartbeatResponse, ClientError> {
        let resp = self.http.post(format!("{}/api/v1/nodes/heartbeat", self.base_url)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn runs_for_node(&self, node_id: &str) -> Result<Vec<RunResponse>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/nodes/{}/runs", self.base_url, node_id)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn actions_for_node(&self, node_id: &str) -> Result<Vec<ActionDetailResponse>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/nodes/{}/actions", self.base_url, node_id)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn terminal_sessions_for_node(
        &self,
        node_id: &str,
    ) -> Result<Vec<fleet_core::TerminalSession>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/nodes/{}/terminal-sessions", self.base_url, node_id))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn append_run_events(&self, run_id: &str, req: &AppendEventsRequest) -> Result<(), ClientError> {
        let resp =
            self.http.post(format!("{}/api/v1/runs/{}/events", self.base_url, run_id)).json(req).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn patch_run(&self, run_id: &str, req: &PatchRunRequest) -> Result<RunResponse, ClientError> {
        let resp = self.http.patch(format!("{}/api/v1/runs/{}", self.base_url, run_id)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn patch_action(
        &self,
        action_id: &str,
        req: &PatchActionRequest,
    ) -> Result<ActionDetailResponse, ClientError> {
        let resp =
            self.http.patch(format!("{}/api/v1/actions/{}", self.base_url, action_id)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn pending_instances_for_node(&self, node_id: &str) -> Result<Vec<Instance>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/nodes/{}/instances/pending", self.base_url, node_id))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_instance(&self, instance_id: &str) -> Result<Option<Instance>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/instances/{}", self.base_url, instance_id)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(resp).await?.json().await?))
    }

    pub async fn instances_for_account(&self, account_id: &str) -> Result<Vec<Instance>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/instances?account_id={}", self.base_url, account_id))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<Account>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/accounts/{}", self.base_url, account_id)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(resp).await?.json().await?))
    }

    pub async fn patch_instance_running(&self, instance_id: &str) -> Result<Instance, ClientError> {
        let resp = self
            .http
            .patch(format!("{}/api/v1/instances/{}", self.base_url, instance_id))
            .json(&serde_json::json!({ "status": "running" }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn patch_terminal_session_running(
        &self,
        session_id: &str,
        port: u16,
        url: &str,
    ) -> Result<TerminalSession, ClientError> {
        let resp = self
            .http
            .patch(format!("{}/api/v1/terminal-sessions/{}", self.base_url, session_id))
            .json(&serde_json::json!({ "status": "running", "port": port, "url": url }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn patch_terminal_session_closed(&self, session_id: &str) -> Result<TerminalSession, ClientError> {
        let resp = self
            .http
            .patch(format!("{}/api/v1/terminal-sessions/{}", self.base_url, session_id))
            .json(&serde_json::json!({ "status": "closed" }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
