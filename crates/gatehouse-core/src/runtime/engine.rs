// crates/gatehouse-core/src/runtime/engine.rs
// ============================================================================
// Module: Gatehouse Decision Engine
// Description: Compiled rules and first-match-wins evaluation.
// Purpose: Map a request to the authentication level it requires.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RuleSet`] is an ordered list of compiled [`Rule`]s plus a default
//! level. Evaluation walks the rules in order and stops at the first rule
//! whose every constrained dimension matches. Evaluation is pure and never
//! fails, so a rule set can be shared across threads without locking.
//!
//! Security posture: the compiler forces a rule that lost a network or subject
//! constraint to deny, so a misconfigured rule still stops evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::level::Level;
use crate::core::request::RequestContext;
use crate::matchers::DomainPattern;
use crate::matchers::MethodSet;
use crate::matchers::NetworkHandles;
use crate::matchers::NetworkTable;
use crate::matchers::ResourcePattern;
use crate::matchers::SubjectClause;
use crate::matchers::clauses_match;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One compiled access-control rule.
///
/// # Invariants
/// - Empty `domains`, `resources`, `methods` or `subjects` impose no constraint.
/// - `networks == None` imposes no constraint; compiled rules never carry `Some(empty)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Position in the configured rule list.
    pub(crate) index: usize,
    /// Domain patterns (OR).
    pub(crate) domains: Vec<DomainPattern>,
    /// Path patterns (OR).
    pub(crate) resources: Vec<ResourcePattern>,
    /// Allowed methods.
    pub(crate) methods: MethodSet,
    /// Allowed source ranges.
    pub(crate) networks: Option<NetworkHandles>,
    /// Subject clauses (OR of AND).
    pub(crate) subjects: Vec<SubjectClause>,
    /// Level imposed when the rule matches.
    pub(crate) policy: Level,
}

impl Rule {
    /// Returns true when every constrained dimension matches `request`.
    #[must_use]
    pub fn matches(&self, networks: &NetworkTable, request: &RequestContext) -> bool {
        self.matches_domain(&request.domain)
            && self.matches_resource(&request.path)
            && self.methods.matches(&request.method)
            && self.matches_network(networks, request)
            && clauses_match(&self.subjects, request.identity.as_ref())
    }

    /// Domain dimension.
    fn matches_domain(&self, domain: &str) -> bool {
        self.domains.is_empty() || self.domains.iter().any(|pattern| pattern.matches(domain))
    }

    /// Resource dimension.
    fn matches_resource(&self, path: &str) -> bool {
        self.resources.is_empty() || self.resources.iter().any(|pattern| pattern.matches(path))
    }

    /// Network dimension.
    fn matches_network(&self, networks: &NetworkTable, request: &RequestContext) -> bool {
        self.networks
            .as_ref()
            .is_none_or(|handles| networks.contains_any(handles, request.source))
    }

    /// Position in the configured rule list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Domain patterns.
    #[must_use]
    pub fn domains(&self) -> &[DomainPattern] {
        &self.domains
    }

    /// Resource patterns.
    #[must_use]
    pub fn resources(&self) -> &[ResourcePattern] {
        &self.resources
    }

    /// Method set.
    #[must_use]
    pub const fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// Network handles, `None` when unconstrained.
    #[must_use]
    pub fn networks(&self) -> Option<&NetworkHandles> {
        self.networks.as_ref()
    }

    /// Subject clauses.
    #[must_use]
    pub fn subjects(&self) -> &[SubjectClause] {
        &self.subjects
    }

    /// Level imposed by the rule.
    #[must_use]
    pub const fn policy(&self) -> Level {
        self.policy
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Engine output for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// Required level.
    pub level: Level,
    /// Index of the deciding rule; `None` when the default applied.
    pub matched_rule: Option<usize>,
}

// ============================================================================
// SECTION: Rule Sets
// ============================================================================

/// Ordered, immutable rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Rules in evaluation order.
    rules: Vec<Rule>,
    /// Level applied when no rule matches.
    default_policy: Level,
    /// Range arena referenced by rule handles.
    networks: NetworkTable,
}

impl RuleSet {
    /// Assembles a rule set from compiled parts.
    #[must_use]
    pub(crate) const fn new(rules: Vec<Rule>, default_policy: Level, networks: NetworkTable) -> Self {
        Self {
            rules,
            default_policy,
            networks,
        }
    }

    /// Rule set with no rules.
    #[must_use]
    pub fn empty(default_policy: Level) -> Self {
        Self::new(Vec::new(), default_policy, NetworkTable::default())
    }

    /// Evaluates `request` and reports which rule decided.
    #[must_use]
    pub fn evaluate(&self, request: &RequestContext) -> Evaluation {
        self.rules
            .iter()
            .find(|rule| rule.matches(&self.networks, request))
            .map_or(
                Evaluation {
                    level: self.default_policy,
                    matched_rule: None,
                },
                |rule| Evaluation {
                    level: rule.policy,
                    matched_rule: Some(rule.index),
                },
            )
    }

    /// Required level for `request`.
    #[must_use]
    pub fn required_level(&self, request: &RequestContext) -> Level {
        self.evaluate(request).level
    }

    /// Returns true when any rule or the default demands two factors.
    #[must_use]
    pub fn requires_second_factor(&self) -> bool {
        self.default_policy == Level::TwoFactor
            || self.rules.iter().any(|rule| rule.policy == Level::TwoFactor)
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Level applied when no rule matches.
    #[must_use]
    pub const fn default_policy(&self) -> Level {
        self.default_policy
    }

    /// Range arena.
    #[must_use]
    pub const fn networks(&self) -> &NetworkTable {
        &self.networks
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Required level for `request` under `rule_set`.
#[must_use]
pub fn required_level(rule_set: &RuleSet, request: &RequestContext) -> Level {
    rule_set.required_level(request)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
