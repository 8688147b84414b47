// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-Run append-only event log records.
//!
//! Unlike [`crate::task`]/[`crate::run`], event *type tags* are not a closed
//! enum: drivers (external collaborators, out of scope here, see §4.9) emit
//! whatever tag their agent family produces. The two tags the core itself
//! understands structurally are `run_started` (always seq 1) and
//! `run_completed` (always last); everything in between is opaque to the
//! control plane and only re-surfaced to readers.

use crate::run::RunId;
use serde::{Deserialize, Serialize};

/// Well-known event type tags. `Custom` carries through anything a driver
/// emits that the core doesn't need to special-case.
///
/// Serializes/deserializes as a plain string (`"run_started"`, `"agent_text"`,
/// ...) rather than as a serde-tagged enum, since unknown tags must round-trip
/// through `Custom` instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    RunStarted,
    RunCompleted,
    Custom(String),
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::RunStarted => write!(f, "run_started"),
            EventType::RunCompleted => write!(f, "run_completed"),
            EventType::Custom(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "run_started" => EventType::RunStarted,
            "run_completed" => EventType::RunCompleted,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::from(s.as_str()))
    }
}

/// One ordered record within a Run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// Auto-assigned store-local id; not meaningful outside one store instance.
    #[serde(default)]
    pub id: u64,
    pub run_id: RunId,
    /// 1-based, strictly increasing, no gaps expected, unique within `run_id`.
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Original stdout line the driver parsed this event from, if any.
    #[serde(default)]
    pub raw: Option<String>,
}

impl RunEvent {
    pub fn run_started(run_id: RunId, timestamp_ms: u64) -> Self {
        Self {
            id: 0,
            run_id,
            seq: 1,
            event_type: EventType::RunStarted,
            timestamp_ms,
            payload: serde_json::json!({}),
            raw: None,
        }
    }

    pub fn run_completed(run_id: RunId, seq: u64, timestamp_ms: u64, status: &str) -> Self {
        Self {
            id: 0,
            run_id,
            seq,
            event_type: EventType::RunCompleted,
            timestamp_ms,
            payload: serde_json::json!({ "status": status }),
            raw: None,
        }
    }
}

/// Strictly-increasing sequence allocator for one Run, owned by the
/// executor worker that drives that Run. One allocator per Run, since the
/// coordination bus's seq-allocation trick (§4.7) is only race-tolerant
/// under a single-producer assumption — matched here structurally.
#[derive(Debug, Default)]
pub struct SeqAllocator {
    next: u64,
}

impl SeqAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_allocator_starts_at_one_and_increments() {
        let mut alloc = SeqAllocator::new();
        assert_eq!(alloc.next_seq(), 1);
        assert_eq!(alloc.next_seq(), 2);
        assert_eq!(alloc.next_seq(), 3);
    }

    #[test]
    fn event_type_display_for_custom() {
        assert_eq!(EventType::Custom("agent_text".into()).to_string(), "agent_text");
        assert_eq!(EventType::RunStarted.to_string(), "run_started");
    }

    #[test]
    fn run_started_is_seq_one() {
        let ev = RunEvent::run_started(RunId::from_string("run-1"), 1000);
        assert_eq!(ev.seq, 1);
        assert_eq!(ev.event_type, EventType::RunStarted);
    }
}
