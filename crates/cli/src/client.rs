// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin REST client for the control plane. Every subcommand is a single
//! call through here, rendered by [`crate::output`].

use fleet_core::{Action, Node, Operation, Run, Task};
use fleet_wire::pagination::Page;
use fleet_wire::request::{CreateOperationRequest, CreateTaskRequest, ExecuteTaskRequest};
use fleet_wire::response::{
    ExecuteTaskResponse, OperationCreateResponse, OperationDetailResponse, TaskResponse, TaskTreeResponse,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to control plane failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("control plane returned {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },
    #[error("not found")]
    NotFound,
}

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
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::Api { status, body })
        }
    }

    pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, ClientError> {
        let resp = self.http.post(format!("{}/api/v1/tasks", self.base_url)).json(req).send().await?;
        let body: TaskResponse = Self::check(resp).await?.json().await?;
        Ok(body.task)
    }

    pub async fn list_tasks(&self, params: &[(&str, String)]) -> Result<Page<Task>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/tasks", self.base_url)).query(params).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/tasks/{}", self.base_url, id)).send().await?;
        let body: TaskResponse = Self::check(resp).await?.json().await?;
        Ok(body.task)
    }

    pub async fn task_tree(&self, id: &str) -> Result<TaskTreeResponse, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/tasks/{}/tree", self.base_url, id)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let resp = self.http.delete(format!("{}/api/v1/tasks/{}", self.base_url, id)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn execute_task(&self, id: &str, req: &ExecuteTaskRequest) -> Result<ExecuteTaskResponse, ClientError> {
        let resp = self.http.post(format!("{}/api/v1/tasks/{}/execute", self.base_url, id)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_run(&self, id: &str) -> Result<Run, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/runs/{}", self.base_url, id)).send().await?;
        let body: fleet_wire::response::RunResponse = Self::check(resp).await?.json().await?;
        Ok(body.run)
    }

    pub async fn run_events(&self, id: &str, from_seq: u64) -> Result<Vec<fleet_core::RunEvent>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/runs/{}/events", self.base_url, id))
            .query(&[("from_seq", from_seq.to_string())])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn create_operation(&self, req: &CreateOperationRequest) -> Result<OperationCreateResponse, ClientError> {
        let resp = self.http.post(format!("{}/api/v1/operations", self.base_url)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_operations(&self, params: &[(&str, String)]) -> Result<Page<Operation>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/operations", self.base_url)).query(params).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_operation(&self, id: &str) -> Result<OperationDetailResponse, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/operations/{}", self.base_url, id)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_action(&self, id: &str) -> Result<Action, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/actions/{}", self.base_url, id)).send().await?;
        let body: fleet_wire::response::ActionDetailResponse = Self::check(resp).await?.json().await?;
        Ok(body.action)
    }

    pub async fn list_nodes(&self) -> Result<Vec<Node>, ClientError> {
        let resp = self.http.get(format!("{}/api/v1/nodes", self.base_url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
