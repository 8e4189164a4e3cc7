// crates/gatehouse-core/src/runtime/compiler.rs
// ============================================================================
// Module: Gatehouse Rule Compiler
// Description: Compiles rule specifications into an immutable rule set.
// Purpose: Resolve networks, subjects and patterns once per load.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`compile`] turns raw [`RuleSpec`]s and [`NetworkGroupSpec`]s into a
//! [`RuleSet`]. Malformed resource patterns are fatal and every one of them is
//! collected before failing. Everything else degrades to a warning and fails
//! closed: unknown policies become `deny`. A rule that loses its network or
//! subject constraint keeps its other dimensions but is forced to `deny`, so
//! requests it was meant to cover cannot fall through to a later, weaker rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::level::Level;
use crate::core::spec::NetworkGroupSpec;
use crate::core::spec::RuleSpec;
use crate::matchers::DomainPattern;
use crate::matchers::GroupIssue;
use crate::matchers::MethodSet;
use crate::matchers::NetworkHandles;
use crate::matchers::NetworkParseError;
use crate::matchers::NetworkResolver;
use crate::matchers::ResourcePattern;
use crate::matchers::SubjectClause;
use crate::matchers::SubjectParseError;
use crate::runtime::engine::Rule;
use crate::runtime::engine::RuleSet;

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Problem found while compiling the access-control table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileIssue {
    /// A resource pattern is not a valid regular expression. Fatal.
    #[error("rule {rule}: invalid resource pattern {pattern:?}: {message}")]
    InvalidResource {
        /// Rule index.
        rule: usize,
        /// Offending pattern.
        pattern: String,
        /// Regex engine message.
        message: String,
    },
    /// A policy keyword is unknown and was replaced by `deny`.
    #[error("{}: unknown policy {policy:?}, using deny", describe_rule(*.rule))]
    UnknownPolicy {
        /// Rule index; `None` for the default policy.
        rule: Option<usize>,
        /// Offending keyword.
        policy: String,
    },
    /// A literal inside a named network group was skipped.
    #[error("network group {group:?}: {error}")]
    InvalidGroupNetwork {
        /// Group name.
        group: String,
        /// Parse failure.
        error: NetworkParseError,
    },
    /// A rule network reference is neither a group nor a valid literal.
    #[error("rule {rule}: {error}")]
    InvalidRuleNetwork {
        /// Rule index.
        rule: usize,
        /// Parse failure.
        error: NetworkParseError,
    },
    /// A network group name was declared twice; the first declaration wins.
    #[error("network group {name:?} declared more than once")]
    DuplicateNetworkGroup {
        /// Group name.
        name: String,
    },
    /// A subject entry was malformed; the rule is degraded.
    #[error("rule {rule}, subject clause {clause}: {error}")]
    InvalidSubject {
        /// Rule index.
        rule: usize,
        /// Clause index within the rule.
        clause: usize,
        /// Parse failure.
        error: SubjectParseError,
    },
    /// A rule lost a network or subject constraint and now denies.
    #[error("rule {rule}: unresolved {dimensions}, rule now denies every request it covers")]
    DegradedRule {
        /// Rule index.
        rule: usize,
        /// Comma-separated dimensions that could not be resolved.
        dimensions: String,
    },
}

impl CompileIssue {
    /// Returns true when the issue prevents publishing a rule set.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidResource { .. })
    }
}

/// Labels a rule index for issue messages.
fn describe_rule(rule: Option<usize>) -> String {
    rule.map_or_else(|| "default policy".to_string(), |index| format!("rule {index}"))
}

impl From<GroupIssue> for CompileIssue {
    fn from(issue: GroupIssue) -> Self {
        match issue {
            GroupIssue::Duplicate {
                name,
            } => Self::DuplicateNetworkGroup {
                name,
            },
            GroupIssue::InvalidNetwork {
                group,
                error,
            } => Self::InvalidGroupNetwork {
                group,
                error,
            },
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Compiled rule set.
    pub rule_set: RuleSet,
    /// Non-fatal issues.
    pub warnings: Vec<CompileIssue>,
}

/// Failed compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access control compilation failed with {} error(s)", .errors.len())]
pub struct CompileError {
    /// Fatal issues, in rule order.
    pub errors: Vec<CompileIssue>,
    /// Non-fatal issues found alongside.
    pub warnings: Vec<CompileIssue>,
}

// ============================================================================
// SECTION: Compilation
// ============================================================================

/// Compiles rules, network groups and the default policy into a rule set.
///
/// # Errors
///
/// Returns [`CompileError`] when any resource pattern is malformed.
pub fn compile(
    rules: &[RuleSpec],
    groups: &[NetworkGroupSpec],
    default_policy: &str,
) -> Result<Compilation, CompileError> {
    let mut resolver = NetworkResolver::new();
    let mut issues: Vec<CompileIssue> =
        resolver.resolve_groups(groups).into_iter().map(CompileIssue::from).collect();

    let default_level = resolve_policy(default_policy, None, &mut issues);
    let mut compiled = Vec::with_capacity(rules.len());
    for (index, spec) in rules.iter().enumerate() {
        compiled.push(compile_rule(index, spec, &mut resolver, &mut issues));
    }

    let (errors, warnings): (Vec<_>, Vec<_>) =
        issues.into_iter().partition(CompileIssue::is_fatal);
    if !errors.is_empty() {
        return Err(CompileError {
            errors,
            warnings,
        });
    }
    Ok(Compilation {
        rule_set: RuleSet::new(compiled, default_level, resolver.into_table()),
        warnings,
    })
}

/// Compiles one rule, appending any issues.
fn compile_rule(
    index: usize,
    spec: &RuleSpec,
    resolver: &mut NetworkResolver,
    issues: &mut Vec<CompileIssue>,
) -> Rule {
    let domains = spec
        .domains
        .iter()
        .filter(|domain| !domain.trim().is_empty())
        .map(|domain| DomainPattern::new(domain))
        .collect();

    let mut resources = Vec::with_capacity(spec.resources.len());
    for pattern in &spec.resources {
        match ResourcePattern::new(pattern) {
            Ok(compiled) => resources.push(compiled),
            Err(error) => issues.push(CompileIssue::InvalidResource {
                rule: index,
                pattern: pattern.clone(),
                message: error.to_string(),
            }),
        }
    }

    let mut degraded: Vec<&str> = Vec::new();
    let mut networks = None;
    if !spec.networks.is_empty() {
        let mut handles = NetworkHandles::new();
        let mut unresolved = false;
        for reference in &spec.networks {
            unresolved |= resolver.is_degraded(reference);
            match resolver.resolve_reference(reference) {
                Ok(resolved) => {
                    for handle in resolved {
                        if !handles.contains(&handle) {
                            handles.push(handle);
                        }
                    }
                }
                Err(error) => {
                    unresolved = true;
                    issues.push(CompileIssue::InvalidRuleNetwork {
                        rule: index,
                        error,
                    });
                }
            }
        }
        if unresolved || handles.is_empty() {
            degraded.push("networks");
        } else {
            networks = Some(handles);
        }
    }

    // An empty entry list is a zero-predicate clause and matches everyone.
    let mut subjects = Vec::with_capacity(spec.subjects.len());
    let mut malformed = false;
    for (clause_index, entries) in spec.subjects.iter().enumerate() {
        let (clause, errors) = SubjectClause::parse(entries);
        malformed |= !errors.is_empty();
        issues.extend(errors.into_iter().map(|error| CompileIssue::InvalidSubject {
            rule: index,
            clause: clause_index,
            error,
        }));
        subjects.push(clause);
    }
    if malformed {
        degraded.push("subjects");
        subjects.clear();
    }

    let mut policy = resolve_policy(&spec.policy, Some(index), issues);
    if !degraded.is_empty() {
        issues.push(CompileIssue::DegradedRule {
            rule: index,
            dimensions: degraded.join(", "),
        });
        policy = Level::Denied;
    }

    Rule {
        index,
        domains,
        resources,
        methods: MethodSet::new(&spec.methods),
        networks,
        subjects,
        policy,
    }
}

/// Maps a policy keyword, recording unknown keywords.
fn resolve_policy(policy: &str, rule: Option<usize>, issues: &mut Vec<CompileIssue>) -> Level {
    Level::parse_policy(policy.trim()).unwrap_or_else(|| {
        issues.push(CompileIssue::UnknownPolicy {
            rule,
            policy: policy.to_string(),
        });
        Level::Denied
    })
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

    use std::net::IpAddr;

    use super::*;
    use crate::core::request::RequestContext;

    fn request(domain: &str, source: &str) -> RequestContext {
        RequestContext::new(domain, "/", "GET", source.parse::<IpAddr>().unwrap())
    }

    #[test]
    fn bad_resources_are_all_reported() {
        let rules = vec![
            RuleSpec::new(["a.example.com"], "bypass").with_resources(vec!["(".into()]),
            RuleSpec::new(["b.example.com"], "bypass"),
            RuleSpec::new(["c.example.com"], "bypass").with_resources(vec!["[".into()]),
        ];
        let error = compile(&rules, &[], "deny").unwrap_err();
        assert_eq!(error.errors.len(), 2);
        assert!(matches!(&error.errors[0], CompileIssue::InvalidResource { rule: 0, .. }));
        assert!(matches!(&error.errors[1], CompileIssue::InvalidResource { rule: 2, .. }));
    }

    #[test]
    fn unknown_policies_fail_closed() {
        let rules = vec![RuleSpec::new(["a.example.com"], "allow_all")];
        let compilation = compile(&rules, &[], "sometimes").unwrap();
        assert_eq!(compilation.rule_set.default_policy(), Level::Denied);
        assert_eq!(compilation.rule_set.rules()[0].policy(), Level::Denied);
        assert_eq!(compilation.warnings.len(), 2);
        assert!(
            compilation
                .warnings
                .iter()
                .any(|issue| matches!(issue, CompileIssue::UnknownPolicy { rule: None, .. }))
        );
    }

    #[test]
    fn unresolvable_networks_force_the_rule_to_deny() {
        let rules = vec![
            RuleSpec::new(["a.example.com"], "bypass").with_networks(vec!["nowhere".into()]),
            RuleSpec::new(["*.example.com"], "bypass"),
        ];
        let compilation = compile(&rules, &[], "deny").unwrap();
        assert_eq!(compilation.warnings.len(), 2);
        assert!(matches!(
            &compilation.warnings[1],
            CompileIssue::DegradedRule { rule: 0, dimensions } if dimensions == "networks"
        ));
        let rule_set = compilation.rule_set;
        assert!(rule_set.rules()[0].networks().is_none());
        let evaluation = rule_set.evaluate(&request("a.example.com", "203.0.113.9"));
        assert_eq!(evaluation.level, Level::Denied);
        assert_eq!(evaluation.matched_rule, Some(0));
        assert_eq!(rule_set.required_level(&request("b.example.com", "10.0.0.1")), Level::Bypass);
    }

    #[test]
    fn partially_resolved_networks_still_degrade() {
        let groups = vec![NetworkGroupSpec::new(
            "office",
            vec!["10.0.0.0/8".into(), "192.168.0.0/33".into()],
        )];
        let rules = vec![
            RuleSpec::new(["a.example.com"], "one_factor").with_networks(vec!["office".into()]),
            RuleSpec::new(["b.example.com"], "one_factor")
                .with_networks(vec!["10.0.0.0/8".into(), "typo".into()]),
        ];
        let compilation = compile(&rules, &groups, "deny").unwrap();
        let rule_set = compilation.rule_set;
        assert_eq!(rule_set.rules()[0].policy(), Level::Denied);
        assert_eq!(rule_set.rules()[1].policy(), Level::Denied);
        assert_eq!(rule_set.required_level(&request("a.example.com", "192.168.1.1")), Level::Denied);
    }

    #[test]
    fn group_and_literal_references_share_ranges() {
        let groups = vec![NetworkGroupSpec::new("internal", vec!["10.0.0.0/8".into()])];
        let rules = vec![
            RuleSpec::new(["a.example.com"], "one_factor").with_networks(vec!["internal".into()]),
            RuleSpec::new(["b.example.com"], "one_factor")
                .with_networks(vec!["10.0.0.0/8".into(), "internal".into()]),
        ];
        let compilation = compile(&rules, &groups, "deny").unwrap();
        assert!(compilation.warnings.is_empty());
        let rule_set = compilation.rule_set;
        assert_eq!(rule_set.networks().len(), 1);
        assert_eq!(rule_set.rules()[1].networks().unwrap().len(), 1);
    }

    #[test]
    fn bad_subject_is_reported_with_clause_position() {
        let rules = vec![
            RuleSpec::new(["a.example.com"], "one_factor")
                .with_subjects(vec![vec!["group:admins".into()], vec!["bob".into()]]),
        ];
        let compilation = compile(&rules, &[], "deny").unwrap();
        assert_eq!(compilation.warnings.len(), 2);
        assert!(matches!(
            &compilation.warnings[0],
            CompileIssue::InvalidSubject { rule: 0, clause: 1, .. }
        ));
        assert!(matches!(
            &compilation.warnings[1],
            CompileIssue::DegradedRule { rule: 0, dimensions } if dimensions == "subjects"
        ));
        let rule = &compilation.rule_set.rules()[0];
        assert!(rule.subjects().is_empty());
        assert_eq!(rule.policy(), Level::Denied);
    }

    #[test]
    fn empty_subject_clause_is_kept_and_matches_anonymous() {
        let rules = vec![
            RuleSpec::new(["app.example.com"], "deny")
                .with_subjects(vec![Vec::new(), vec!["user:bob".into()]]),
            RuleSpec::new(["app.example.com"], "bypass"),
        ];
        let compilation = compile(&rules, &[], "deny").unwrap();
        assert!(compilation.warnings.is_empty());
        assert_eq!(compilation.rule_set.rules()[0].subjects().len(), 2);
        let evaluation = compilation.rule_set.evaluate(&request("app.example.com", "10.0.0.1"));
        assert_eq!(evaluation.level, Level::Denied);
        assert_eq!(evaluation.matched_rule, Some(0));
    }

    #[test]
    fn inputs_are_left_untouched() {
        let rules = vec![RuleSpec::new(["*.Example.com"], "TWO_FACTOR")];
        let before = rules.clone();
        let _ = compile(&rules, &[], "deny");
        assert_eq!(rules, before);
    }
}
