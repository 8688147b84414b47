// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("test-");
}

#[test]
fn define_id_new_has_prefix_and_fixed_len() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("test-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_from_string_round_trips() {
    let id = TestId::from_string("test-abc");
    assert_eq!(id.as_str(), "test-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn define_id_hash_map_lookup() {
    let mut map = HashMap::new();
    let id = TestId::from_string("test-k");
    map.insert(id, 42);
    assert_eq!(map.get("test-k"), Some(&42));
}

#[test]
fn define_id_short_truncates_suffix() {
    let id = TestId::from_string("test-abcdefghijklmnop");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn define_id_short_returns_full_when_shorter() {
    let id = TestId::from_string("test-ab");
    assert_eq!(id.short(8), "ab");
}

#[test]
fn define_id_display_matches_as_str() {
    let id = TestId::from_string("test-xyz");
    assert_eq!(id.to_string(), "test-xyz");
}

#[test]
fn define_id_two_new_calls_differ() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn define_id_is_empty() {
    assert!(!TestId::new().is_empty());
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}

#[test]
#[should_panic]
fn id_buf_new_panics_over_capacity() {
    let too_long = "x".repeat(ID_MAX_LEN + 1);
    let _ = IdBuf::new(&too_long);
}
