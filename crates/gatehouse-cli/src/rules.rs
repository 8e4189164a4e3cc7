// crates/gatehouse-cli/src/rules.rs
// ============================================================================
// Module: Rule Listing
// Description: Text rendering of a compiled rule table.
// Purpose: Back `gatehouse rules` with a stable, reviewable format.
// Dependencies: gatehouse-core
// ============================================================================

//! ## Overview
//! One line per rule in evaluation order, followed by the default policy.
//! Unconstrained criteria are omitted; network handles are resolved back to
//! ranges through the rule set's table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use gatehouse_core::Rule;
use gatehouse_core::RuleSet;
use gatehouse_core::matchers::NetworkTable;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the whole table, one line per rule plus a trailing default line.
#[must_use]
pub fn render_rule_set(rule_set: &RuleSet) -> Vec<String> {
    let mut lines: Vec<String> =
        rule_set.rules().iter().map(|rule| render_rule(rule, rule_set.networks())).collect();
    lines.push(format!("default: {}", rule_set.default_policy()));
    lines
}

/// Renders one rule.
#[must_use]
pub fn render_rule(rule: &Rule, networks: &NetworkTable) -> String {
    let mut line = format!("#{} {}", rule.index(), rule.policy());
    let domains: Vec<String> = rule.domains().iter().map(ToString::to_string).collect();
    if !domains.is_empty() {
        let _ = write!(line, " domains={}", domains.join(","));
    }
    if !rule.methods().is_empty() {
        let _ = write!(line, " methods={}", rule.methods().methods().join(","));
    }
    if let Some(handles) = rule.networks() {
        let ranges: Vec<String> = handles
            .iter()
            .filter_map(|handle| networks.get(*handle))
            .map(ToString::to_string)
            .collect();
        let _ = write!(line, " networks={}", ranges.join(","));
    }
    if !rule.resources().is_empty() {
        let resources: Vec<&str> = rule.resources().iter().map(|pattern| pattern.as_str()).collect();
        let _ = write!(line, " resources={}", resources.join(","));
    }
    if !rule.subjects().is_empty() {
        let clauses: Vec<String> =
            rule.subjects().iter().map(|clause| format!("({clause})")).collect();
        let _ = write!(line, " subjects={}", clauses.join("|"));
    }
    line
}

// ============================================================================
// SECTION: Tests
// ============================================================================
