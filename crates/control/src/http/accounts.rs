// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/v1/accounts` read surface (§4.4, §9 account uniqueness resolution).

use axum::extract::{Path, State};
use axum::Json;
use fleet_core::{Account, AccountId};

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn list_accounts(State(state): State<SharedState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.store.list_accounts()?))
}

pub async fn get_account(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Account>, ApiError> {
    let account = state.store.get_account(&AccountId::from_string(id))?.ok_or(ApiError::NotFound)?;
    Ok(Json(account))
}
