// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key layout for the coordination bus (§4.7).
//!
//! Lexicographic key order is load-bearing: `event_key`'s zero-padded
//! sequence number makes a prefix range-scan of `/events/{type}/{id}/`
//! come back already in `seq` order.

/// 30 s liveness lease key for a node.
pub fn node_heartbeat_key(node_id: &str) -> String {
    format!("/nodes/{node_id}/heartbeat")
}

/// One event within a workflow's append-only log, `seq` zero-padded to 6
/// digits so keys sort numerically under plain byte comparison.
pub fn event_key(workflow_type: &str, workflow_id: &str, seq: u64) -> String {
    format!("/events/{workflow_type}/{workflow_id}/{seq:06}")
}

/// Prefix covering every event key for one workflow, for range-scan + watch.
pub fn event_prefix(workflow_type: &str, workflow_id: &str) -> String {
    format!("/events/{workflow_type}/{workflow_id}/")
}

/// Latest-state singleton key for a workflow (overwritten in place, no lease).
pub fn state_key(workflow_type: &str, workflow_id: &str) -> String {
    format!("/state/{workflow_type}/{workflow_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_key_zero_pads_to_six_digits() {
        assert_eq!(event_key("run", "run-1", 7), "/events/run/run-1/000007");
        assert_eq!(event_key("run", "run-1", 123456), "/events/run/run-1/123456");
    }

    #[test]
    fn event_keys_sort_lexicographically_in_seq_order() {
        let mut keys: Vec<String> = (1..=12).map(|seq| event_key("run", "run-1", seq)).collect();
        let sorted = {
            let mut k = keys.clone();
            k.sort();
            k
        };
        keys.sort_by_key(|k| k.clone());
        assert_eq!(keys, sorted);
    }

    #[test]
    fn event_prefix_is_a_strict_prefix_of_its_keys() {
        let prefix = event_prefix("run", "run-1");
        assert!(event_key("run", "run-1", 1).starts_with(&prefix));
    }
}
