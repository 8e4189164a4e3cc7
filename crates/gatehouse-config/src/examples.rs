// crates/gatehouse-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Gatehouse configuration. The example loads, validates
//! and compiles without warnings.

/// Returns a canonical example `gatehouse.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[access_control]
default_policy = "deny"
strict = false

[[access_control.networks]]
name = "localhost"
networks = ["127.0.0.1", "::1"]

[[access_control.networks]]
name = "internal"
networks = ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"]

[[access_control.rules]]
domain = "public.example.com"
policy = "bypass"

[[access_control.rules]]
domain = "*.example.com"
policy = "bypass"
methods = ["OPTIONS"]

[[access_control.rules]]
domain = "secure.example.com"
policy = "one_factor"
networks = ["localhost", "internal"]

[[access_control.rules]]
domain = ["secure.example.com", "private.example.com"]
policy = "two_factor"

[[access_control.rules]]
domain = "singlefactor.example.com"
policy = "one_factor"

[[access_control.rules]]
domain = "dev.example.com"
policy = "two_factor"
resources = ["^/groups/dev/.*$"]
subject = "group:dev"

[[access_control.rules]]
domain = "dev.example.com"
policy = "two_factor"
resources = ["^/users/john/.*$"]
subject = [["group:dev", "user:john"], "group:admins"]

[[access_control.rules]]
domain = "*.example.com"
policy = "deny"
subject = "group:contractors"

[session]
expiration_ms = 3600000
inactivity_ms = 300000
remember_me_ms = 2592000000

[audit]
enabled = false
# path = "gatehouse-audit.jsonl"
"#,
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;
    use crate::config::ConfigFormat;
    use crate::config::GatehouseConfig;

    #[test]
    fn example_compiles_cleanly() {
        let config =
            GatehouseConfig::from_str_with_format(&config_toml_example(), ConfigFormat::Toml)
                .unwrap();
        let compilation = config.compile().unwrap();
        assert!(compilation.warnings.is_empty());
        assert_eq!(compilation.rule_set.len(), 8);
        assert!(compilation.rule_set.requires_second_factor());
    }
}
