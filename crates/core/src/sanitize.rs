// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting normalisation rules shared by both sides of the dispatch
//! boundary (control plane and executor). Getting either of these wrong on
//! just one side produces orphan Instances — see the regression test below.

/// Replace `.`, `@`, and `-` with `_` in an account name.
///
/// Used to derive the deterministic [`crate::account::AccountId`] from an
/// Operation's `config.name`. Both the control plane (when materialising the
/// Account on Action success) and the executor (when resolving a container by
/// account id) must apply this exact rule.
pub fn sanitize_account_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '.' || c == '@' || c == '-' { '_' } else { c })
        .collect()
}

/// Map an external agent-type string to a concrete driver name.
///
/// Known aliases collapse onto one canonical driver; anything else falls
/// back to `{input}-v1` so new agent types never hard-fail dispatch, they
/// just get a driver name that (by convention) doesn't exist yet.
pub fn normalize_driver_name(agent_type: &str) -> String {
    match agent_type {
        "qwen-code" | "qwencode" | "qwen" => "qwencode-v1".to_string(),
        "gemini" => "gemini-v1".to_string(),
        "claude" => "claude-v1".to_string(),
        other => format!("{other}-v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_dots_at_and_hyphens() {
        assert_eq!(sanitize_account_name("dev@example.com"), "dev_example_com");
    }

    #[test]
    fn sanitize_hyphenated_name_regression() {
        // Regression: hyphens must become underscores on both dispatch and
        // callback sides or Instances resolve against the wrong container.
        assert_eq!(sanitize_account_name("test-free-net"), "test_free_net");
    }

    #[test]
    fn sanitize_leaves_underscores_and_alnum_untouched() {
        assert_eq!(sanitize_account_name("already_fine_123"), "already_fine_123");
    }

    #[test]
    fn sanitize_empty_string() {
        assert_eq!(sanitize_account_name(""), "");
    }

    #[test]
    fn normalize_known_qwen_aliases() {
        for alias in ["qwen-code", "qwencode", "qwen"] {
            assert_eq!(normalize_driver_name(alias), "qwencode-v1");
        }
    }

    #[test]
    fn normalize_known_gemini_and_claude() {
        assert_eq!(normalize_driver_name("gemini"), "gemini-v1");
        assert_eq!(normalize_driver_name("claude"), "claude-v1");
    }

    #[test]
    fn normalize_unknown_falls_back_to_input_v1() {
        assert_eq!(normalize_driver_name("mystery-agent"), "mystery-agent-v1");
    }
}
