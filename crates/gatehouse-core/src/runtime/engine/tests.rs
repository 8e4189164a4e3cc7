// crates/gatehouse-core/src/runtime/engine/tests.rs
// ============================================================================
// Module: Decision Engine Tests
// Description: Unit tests for rule matching and first-match-wins evaluation.
// Purpose: Pin down per-dimension semantics of compiled rules.
// Dependencies: gatehouse-core
// ============================================================================

//! ## Overview
//! Exercises each rule dimension in isolation and the ordering guarantees of
//! [`RuleSet::evaluate`].

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use super::*;
use crate::core::request::Identity;
use crate::core::spec::NetworkGroupSpec;
use crate::core::spec::RuleSpec;
use crate::runtime::compiler::compile;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn build(rules: Vec<RuleSpec>, default_policy: &str) -> RuleSet {
    compile(&rules, &[], default_policy).unwrap().rule_set
}

fn get(domain: &str, path: &str) -> RequestContext {
    RequestContext::new(domain, path, "GET", "192.0.2.10".parse::<IpAddr>().unwrap())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn empty_rule_set_returns_default() {
    let rule_set = RuleSet::empty(Level::OneFactor);
    let evaluation = rule_set.evaluate(&get("a.example.com", "/"));
    assert_eq!(evaluation.level, Level::OneFactor);
    assert_eq!(evaluation.matched_rule, None);
}

#[test]
fn first_matching_rule_wins() {
    let rule_set = build(
        vec![
            RuleSpec::new(["app.example.com"], "bypass").with_resources(vec!["^/public".into()]),
            RuleSpec::new(["app.example.com"], "two_factor"),
            RuleSpec::new(["app.example.com"], "one_factor"),
        ],
        "deny",
    );
    let public = rule_set.evaluate(&get("app.example.com", "/public/logo.png"));
    assert_eq!(public.level, Level::Bypass);
    assert_eq!(public.matched_rule, Some(0));
    let private = rule_set.evaluate(&get("app.example.com", "/settings"));
    assert_eq!(private.level, Level::TwoFactor);
    assert_eq!(private.matched_rule, Some(1));
}

#[test]
fn empty_domain_list_matches_any_domain() {
    let rule_set = build(vec![RuleSpec::new(Vec::<String>::new(), "one_factor")], "deny");
    assert_eq!(rule_set.required_level(&get("whatever.test", "/")), Level::OneFactor);
}

#[test]
fn methods_constrain_case_insensitively() {
    let rule_set = build(
        vec![RuleSpec::new(["api.example.com"], "bypass").with_methods(vec!["options".into()])],
        "one_factor",
    );
    let mut preflight = get("api.example.com", "/v1");
    preflight.method = "OPTIONS".to_string();
    assert_eq!(rule_set.required_level(&preflight), Level::Bypass);
    assert_eq!(rule_set.required_level(&get("api.example.com", "/v1")), Level::OneFactor);
}

#[test]
fn networks_restrict_source_addresses() {
    let groups = vec![NetworkGroupSpec::new("office", vec!["192.0.2.0/24".into()])];
    let rules = vec![
        RuleSpec::new(["intranet.example.com"], "one_factor").with_networks(vec!["office".into()]),
    ];
    let rule_set = compile(&rules, &groups, "deny").unwrap().rule_set;
    assert_eq!(rule_set.required_level(&get("intranet.example.com", "/")), Level::OneFactor);
    let mut remote = get("intranet.example.com", "/");
    remote.source = "198.51.100.1".parse().unwrap();
    assert_eq!(rule_set.required_level(&remote), Level::Denied);
}

#[test]
fn subject_rules_skip_anonymous_callers() {
    let rule_set = build(
        vec![
            RuleSpec::new(["app.example.com"], "one_factor")
                .with_subjects(vec![vec!["group:admins".into()]]),
            RuleSpec::new(["app.example.com"], "two_factor"),
        ],
        "deny",
    );
    assert_eq!(rule_set.required_level(&get("app.example.com", "/")), Level::TwoFactor);
    let admin = get("app.example.com", "/")
        .with_identity(Identity::new("alice", vec!["admins".to_string()]));
    assert_eq!(rule_set.required_level(&admin), Level::OneFactor);
}

#[test]
fn empty_clause_keeps_anonymous_callers_on_the_rule() {
    let rule_set = build(
        vec![
            RuleSpec::new(["app.example.com"], "deny")
                .with_subjects(vec![Vec::new(), vec!["user:bob".into()]]),
            RuleSpec::new(["app.example.com"], "bypass"),
        ],
        "deny",
    );
    let anonymous = rule_set.evaluate(&get("app.example.com", "/"));
    assert_eq!(anonymous.level, Level::Denied);
    assert_eq!(anonymous.matched_rule, Some(0));
    let carol = get("app.example.com", "/").with_identity(Identity::new("carol", Vec::new()));
    assert_eq!(rule_set.evaluate(&carol).matched_rule, Some(0));
}

#[test]
fn misspelled_network_group_does_not_fall_through() {
    let groups = vec![NetworkGroupSpec::new("external", vec!["203.0.113.0/24".into()])];
    let rules = vec![
        RuleSpec::new(["admin.example.com"], "deny").with_networks(vec!["extrenal".into()]),
        RuleSpec::new(["*.example.com"], "bypass"),
    ];
    let compilation = compile(&rules, &groups, "deny").unwrap();
    assert_eq!(compilation.warnings.len(), 2);
    let mut request = get("admin.example.com", "/");
    request.source = "203.0.113.9".parse().unwrap();
    let evaluation = compilation.rule_set.evaluate(&request);
    assert_eq!(evaluation.level, Level::Denied);
    assert_eq!(evaluation.matched_rule, Some(0));
}

#[test]
fn malformed_subject_does_not_fall_through() {
    let rule_set = build(
        vec![
            RuleSpec::new(["app.example.com"], "two_factor")
                .with_subjects(vec![vec!["admins".into()]]),
            RuleSpec::new(["app.example.com"], "bypass"),
        ],
        "deny",
    );
    let evaluation = rule_set.evaluate(&get("app.example.com", "/"));
    assert_eq!(evaluation.level, Level::Denied);
    assert_eq!(evaluation.matched_rule, Some(0));
}

#[test]
fn second_factor_requirement_is_detected() {
    assert!(!build(vec![RuleSpec::new(["a.example.com"], "one_factor")], "deny")
        .requires_second_factor());
    assert!(build(vec![RuleSpec::new(["a.example.com"], "two_factor")], "deny")
        .requires_second_factor());
    assert!(RuleSet::empty(Level::TwoFactor).requires_second_factor());
}

#[test]
fn free_function_matches_method() {
    let rule_set = build(vec![RuleSpec::new(["*.example.com"], "one_factor")], "deny");
    let request = get("x.example.com", "/");
    assert_eq!(required_level(&rule_set, &request), rule_set.required_level(&request));
}
