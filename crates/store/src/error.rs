// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-boundary error type (§7: one `thiserror` enum per crate boundary).

/// Errors surfaced by the [`crate::Store`] trait.
///
/// "Not found" is deliberately *not* a variant here: per §4.1's error
/// contract, absence is `Ok(None)`, never an `Err`. This enum covers only
/// genuine failure — a duplicate-key violation, a WAL I/O fault, or a
/// corrupt record on replay.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt wal entry at seq {seq}: {reason}")]
    Corrupt { seq: u64, reason: String },
}
