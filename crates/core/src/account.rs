// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account: a credential artefact materialised from a successful auth Operation.
//!
//! Unlike every other identifier in this crate, [`AccountId`] is not random:
//! it is derived deterministically from `(agent_type, name)` so that the
//! control plane (materialising the Account when an `api_key`/`oauth`
//! Operation succeeds) and the executor (resolving which on-disk credential
//! volume a Run should mount) always agree on the same id without a round
//! trip. It therefore does not use [`crate::define_id!`], whose nanoid body
//! is for opaque random ids, not deterministic ones.

use crate::node::NodeId;
use crate::sanitize::sanitize_account_name;
use serde::{Deserialize, Serialize};

/// Deterministic identifier: `{agent_type}_{sanitized name}` (invariant 7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Derive the id the same way on both sides of the dispatch boundary.
    /// See the hyphen regression test in [`crate::sanitize`].
    pub fn from_parts(agent_type: &str, name: &str) -> Self {
        Self(format!("{}_{}", agent_type, sanitize_account_name(name)))
    }

    pub fn from_string(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for AccountId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::borrow::Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for AccountId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Authenticating,
    Authenticated,
    Expired,
}

crate::simple_display! {
    AccountStatus {
        Pending => "pending",
        Authenticating => "authenticating",
        Authenticated => "authenticated",
        Expired => "expired",
    }
}

/// A credential artefact materialised from a successful auth Operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub agent_type: String,
    pub node_id: NodeId,
    /// Name of the on-disk volume holding the persisted credential files;
    /// the executor mounts this by name when starting an Instance.
    pub volume_name: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub archive_key: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Account {
    pub fn new(agent_type: &str, name: &str, node_id: NodeId, now_ms: u64) -> Self {
        let id = AccountId::from_parts(agent_type, name);
        let volume_name = format!("fleet-acct-{id}");
        Self {
            id,
            name: name.to_string(),
            agent_type: agent_type.to_string(),
            node_id,
            volume_name,
            status: AccountStatus::Pending,
            archive_key: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Get-or-update semantics for a successful auth Operation landing on an
    /// id that already exists: refresh status in place rather than
    /// rejecting or duplicating the row (§9).
    pub fn mark_authenticated(&mut self, now_ms: u64) {
        self.status = AccountStatus::Authenticated;
        self.updated_at_ms = now_ms;
    }
}

crate::builder! {
    pub struct AccountBuilder => Account {
        into {
            agent_type: String = "claude".to_string(),
            name: String = "dev@example.com".to_string(),
            volume_name: String = "fleet-acct-claude_dev_example_com".to_string(),
        }
        set {
            id: AccountId = AccountId::from_parts("claude", "dev@example.com"),
            node_id: NodeId = crate::node::NodeId::from_string("node-test"),
            status: AccountStatus = AccountStatus::Pending,
            archive_key: Option<String> = None,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_sanitizes_hyphens_in_name() {
        let id = AccountId::from_parts("qwen-code", "test-free-net");
        assert_eq!(id.as_str(), "qwen-code_test_free_net");
    }

    #[test]
    fn account_id_is_stable_across_equivalent_inputs() {
        let a = AccountId::from_parts("claude", "dev@example.com");
        let b = AccountId::from_parts("claude", "dev@example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn new_account_starts_pending() {
        let acct = Account::new("claude", "dev@example.com", NodeId::from_string("node-1"), 0);
        assert_eq!(acct.status, AccountStatus::Pending);
        assert_eq!(acct.id.as_str(), "claude_dev_example_com");
    }

    #[test]
    fn mark_authenticated_reactivates_and_touches() {
        let mut acct = Account::builder().status(AccountStatus::Expired).build();
        acct.mark_authenticated(99);
        assert_eq!(acct.status, AccountStatus::Authenticated);
        assert_eq!(acct.updated_at_ms, 99);
    }
}
