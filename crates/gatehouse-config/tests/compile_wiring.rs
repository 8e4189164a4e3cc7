//! Config-to-engine wiring tests for gatehouse-config.
// crates/gatehouse-config/tests/compile_wiring.rs
// =============================================================================
// Module: Config Compile Wiring Tests
// Description: Validate that loaded configs compile into working gates.
// Purpose: Ensure config semantics reach the decision engine unchanged.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::net::IpAddr;

use gatehouse_config::ConfigFormat;
use gatehouse_config::GatehouseConfig;
use gatehouse_config::config_toml_example;
use gatehouse_core::AuthenticationLevel;
use gatehouse_core::Decision;
use gatehouse_core::Identity;
use gatehouse_core::Level;
use gatehouse_core::RequestContext;
use gatehouse_core::SessionState;
use gatehouse_core::Timestamp;

fn example() -> GatehouseConfig {
    GatehouseConfig::from_str_with_format(&config_toml_example(), ConfigFormat::Toml).unwrap()
}

fn request(domain: &str, path: &str, source: &str) -> RequestContext {
    RequestContext::new(domain, path, "GET", source.parse::<IpAddr>().unwrap())
}

#[test]
fn example_rules_evaluate_in_order() {
    let rule_set = example().compile().unwrap().rule_set;
    assert_eq!(
        rule_set.required_level(&request("public.example.com", "/", "203.0.113.1")),
        Level::Bypass
    );
    assert_eq!(
        rule_set.required_level(&request("secure.example.com", "/", "10.2.3.4")),
        Level::OneFactor
    );
    assert_eq!(
        rule_set.required_level(&request("secure.example.com", "/", "203.0.113.1")),
        Level::TwoFactor
    );
    assert_eq!(rule_set.required_level(&request("example.com", "/", "10.2.3.4")), Level::Denied);

    let mut preflight = request("anything.example.com", "/", "203.0.113.1");
    preflight.method = "options".to_string();
    assert_eq!(rule_set.required_level(&preflight), Level::Bypass);
}

#[test]
fn example_subject_rules_use_identity() {
    let rule_set = example().compile().unwrap().rule_set;
    let john = request("dev.example.com", "/users/john/profile", "203.0.113.1")
        .with_identity(Identity::new("john", vec!["dev".to_string()]));
    assert_eq!(rule_set.evaluate(&john).matched_rule, Some(6));
    let contractor = request("singlefactor.example.com", "/", "203.0.113.1")
        .with_identity(Identity::new("eve", vec!["contractors".to_string()]));
    assert_eq!(rule_set.required_level(&contractor), Level::OneFactor);
    let contractor_elsewhere = request("wiki.example.com", "/", "203.0.113.1")
        .with_identity(Identity::new("eve", vec!["contractors".to_string()]));
    assert_eq!(rule_set.required_level(&contractor_elsewhere), Level::Denied);
}

#[test]
fn built_gate_applies_session_inactivity() {
    let (gate, warnings) = example().build_gate().unwrap();
    assert!(warnings.is_empty());
    let now = Timestamp::from_unix_millis(10_000_000);
    let expires = now.saturating_add_millis(60_000);
    let idle = SessionState::new(AuthenticationLevel::TwoFactor, expires)
        .with_last_activity(Timestamp::from_unix_millis(now.as_unix_millis() - 600_000));
    let active = SessionState::new(AuthenticationLevel::TwoFactor, expires)
        .with_last_activity(Timestamp::from_unix_millis(now.as_unix_millis() - 1_000));
    let target = request("private.example.com", "/", "203.0.113.1");
    assert_eq!(gate.check(&target, Some(&idle), now).decision, Decision::RedirectFirstFactor);
    assert_eq!(gate.check(&target, Some(&active), now).decision, Decision::Allow);
    assert_eq!(gate.check(&target, Some(&idle.clone().remembered()), now).decision, Decision::Allow);
}

#[test]
fn audit_file_receives_decisions() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let mut config = example();
    config.audit.enabled = true;
    config.audit.path = Some(audit_path.to_string_lossy().into_owned());
    let (gate, _) = config.build_gate().unwrap();
    let now = Timestamp::from_unix_millis(0);
    let _ = gate.check(&request("public.example.com", "/", "203.0.113.1"), None, now);
    let contents = std::fs::read_to_string(&audit_path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("\"decision\":\"allow\""));
}

#[test]
fn fatal_resource_errors_surface_as_invalid_config() {
    let toml_text = r#"
[[access_control.rules]]
domain = "a.example.com"
policy = "one_factor"
resources = ["^/(broken"]
"#;
    let config = GatehouseConfig::from_str_with_format(toml_text, ConfigFormat::Toml).unwrap();
    let error = config.compile().unwrap_err();
    assert!(error.to_string().contains("invalid resource pattern"));
}
