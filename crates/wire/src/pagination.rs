// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared list/pagination shapes used by every `GET .../` collection endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Coerce a raw `limit` query param into `[1, MAX_LIMIT]`, defaulting a
/// missing or zero value to `DEFAULT_LIMIT` (§8 boundary behaviours).
pub fn coerce_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_LIMIT,
        Some(n) if n > MAX_LIMIT => MAX_LIMIT,
        Some(n) => n,
    }
}

/// Common filter/pagination query params for list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub since: Option<u64>,
    #[serde(default)]
    pub until: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl ListParams {
    pub fn effective_limit(&self) -> u32 {
        coerce_limit(self.limit)
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// Generic paginated collection envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u32, offset: u32) -> Self {
        let has_more = u64::from(offset) + (items.len() as u64) < total;
        Self { items, total, limit, offset, has_more }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_limit_defaults_zero_and_missing() {
        assert_eq!(coerce_limit(None), DEFAULT_LIMIT);
        assert_eq!(coerce_limit(Some(0)), DEFAULT_LIMIT);
    }

    #[test]
    fn coerce_limit_caps_at_max() {
        assert_eq!(coerce_limit(Some(500)), MAX_LIMIT);
        assert_eq!(coerce_limit(Some(100)), 100);
    }

    #[test]
    fn page_has_more_when_offset_plus_items_below_total() {
        let page = Page::new(vec![1, 2], 10, 2, 0);
        assert!(page.has_more);
        let last = Page::new(vec![1, 2], 10, 2, 8);
        assert!(!last.has_more);
    }

    #[test]
    fn offset_beyond_total_yields_empty_no_more() {
        let page: Page<i32> = Page::new(vec![], 3, 20, 50);
        assert!(!page.has_more);
        assert!(page.items.is_empty());
    }
}
