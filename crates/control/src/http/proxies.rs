// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/proxies` CRUD plus the connectivity-test endpoint (§6).

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{Proxy, ProxyId};
use fleet_wire::request::{CreateProxyRequest, ProxyTestRequest};
use fleet_wire::response::ProxyTestResponse;

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn create_proxy(
    State(state): State<SharedState>,
    Json(req): Json<CreateProxyRequest>,
) -> Result<(StatusCode, Json<Proxy>), ApiError> {
    if req.name.trim().is_empty() || req.url.trim().is_empty() {
        return Err(ApiError::BadRequest("name and url must not be empty".into()));
    }
    let now = state.clock.epoch_ms();
    let proxy = Proxy::new(ProxyId::new(), req.name, req.url, req.is_default, now);
    state.store.upsert_proxy(proxy.clone())?;
    Ok((StatusCode::CREATED, Json(proxy)))
}

pub async fn list_proxies(State(state): State<SharedState>) -> Result<Json<Vec<Proxy>>, ApiError> {
    Ok(Json(state.store.list_proxies()?))
}

pub async fn get_proxy(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Proxy>, ApiError> {
    let proxy = state.store.get_proxy(&ProxyId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(proxy))
}

pub async fn update_proxy(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<CreateProxyRequest>,
) -> Result<Json<Proxy>, ApiError> {
    let id = ProxyId::from_string(id);
    let mut proxy = state.store.get_proxy(&id)?.ok_or(ApiError::NotFound)?;
    proxy.name = req.name;
    proxy.url = req.url;
    proxy.is_default = req.is_default;
    proxy.updated_at_ms = state.clock.epoch_ms();
    state.store.upsert_proxy(proxy.clone())?;
    Ok(Json(proxy))
}

pub async fn delete_proxy(State(state): State<SharedState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = ProxyId::from_string(id);
    state.store.get_proxy(&id)?.ok_or(ApiError::NotFound)?;
    state.store.delete_proxy(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Test reachability of a proxy: a bare TCP dial when no `target_url` is
/// given, or a full HTTP GET routed through the proxy otherwise.
pub async fn test_proxy(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ProxyTestRequest>,
) -> Result<Json<ProxyTestResponse>, ApiError> {
    let proxy = state.store.get_proxy(&ProxyId::from_string(id))?.ok_or(ApiError::NotFound)?;

    let started = Instant::now();
    match req.target_url {
        Some(target_url) => {
            let client = reqwest::Client::builder()
                .proxy(reqwest::Proxy::all(&proxy.url).map_err(|e| ApiError::BadRequest(e.to_string()))?)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            match client.get(&target_url).send().await {
                Ok(resp) => {
                    let status_code = resp.status().as_u16();
                    let headers = resp
                        .headers()
                        .iter()
                        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
                        .collect();
                    let body = resp.text().await.unwrap_or_default();
                    let title = extract_title(&body);
                    Ok(Json(ProxyTestResponse {
                        reachable: true,
                        status_code: Some(status_code),
                        latency_ms: started.elapsed().as_millis() as u64,
                        title,
                        headers,
                    }))
                }
                Err(_) => Ok(Json(ProxyTestResponse {
                    reachable: false,
                    status_code: None,
                    latency_ms: started.elapsed().as_millis() as u64,
                    title: None,
                    headers: Default::default(),
                })),
            }
        }
        None => {
            let host = proxy
                .url
                .trim_start_matches("http://")
                .trim_start_matches("https://")
                .split('/')
                .next()
                .unwrap_or_default();
            let reachable = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                tokio::net::TcpStream::connect(host),
            )
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false);
            Ok(Json(ProxyTestResponse {
                reachable,
                status_code: None,
                latency_ms: started.elapsed().as_millis() as u64,
                title: None,
                headers: Default::default(),
            }))
        }
    }
}

fn extract_title(body: &str) -> Option<String> {
    let start = body.to_lowercase().find("<title>")? + "<title>".len();
    let end = body.to_lowercase()[start..].find("</title>")?;
    Some(body[start..start + end].trim().to_string())
}
