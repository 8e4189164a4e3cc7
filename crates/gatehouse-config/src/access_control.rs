// crates/gatehouse-config/src/access_control.rs
// ============================================================================
// Module: Access-Control Configuration
// Description: `[access_control]` table model, coercion and validation.
// Purpose: Turn operator-written rules into core specifications.
// Dependencies: gatehouse-core, serde
// ============================================================================

//! ## Overview
//! Operators may write most list-valued rule fields as a single scalar. The
//! model accepts both forms and normalizes them before handing plain
//! [`RuleSpec`]s to the core compiler:
//!
//! - `domain = "a.example.com"` and `domain = ["a.example.com"]` are equal.
//! - `subject = "user:bob"` is one clause; `subject = ["user:bob", "group:ops"]`
//!   is two clauses (OR); `subject = [["user:bob", "group:ops"]]` is one
//!   clause (AND).
//!
//! Security posture: config inputs are untrusted; structural problems are
//! rejected here, while degraded references are left to the compiler so they
//! fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gatehouse_core::Compilation;
use gatehouse_core::Level;
use gatehouse_core::NetworkGroupSpec;
use gatehouse_core::POLICY_BYPASS;
use gatehouse_core::POLICY_DENY;
use gatehouse_core::RuleSpec;
use gatehouse_core::compile;
use gatehouse_core::matchers::KNOWN_METHODS;
use gatehouse_core::matchers::is_known_method;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of access-control rules.
pub(crate) const MAX_RULES: usize = 4096;
/// Maximum number of named network groups.
pub(crate) const MAX_NETWORK_GROUPS: usize = 1024;

// ============================================================================
// SECTION: Scalar Coercion
// ============================================================================

/// A string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// Single value.
    One(String),
    /// List of values.
    Many(Vec<String>),
}

impl OneOrMany {
    /// Normalizes to a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Subject field: a scalar, a list of clauses, or a list of AND-lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectConfig {
    /// Single subject forming one clause.
    One(String),
    /// Clauses, each a single subject or an AND-list.
    Clauses(Vec<OneOrMany>),
}

impl SubjectConfig {
    /// Normalizes to an OR-list of AND-clauses.
    #[must_use]
    pub fn to_clauses(&self) -> Vec<Vec<String>> {
        match self {
            Self::One(subject) => vec![vec![subject.clone()]],
            Self::Clauses(clauses) => clauses.iter().map(OneOrMany::to_vec).collect(),
        }
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self::Clauses(Vec::new())
    }
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// `[access_control]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessControlConfig {
    /// Policy applied when no rule matches; empty means `deny`.
    #[serde(default)]
    pub default_policy: String,
    /// Escalates every compile warning to a configuration error.
    #[serde(default)]
    pub strict: bool,
    /// Named network groups.
    #[serde(default)]
    pub networks: Vec<NetworkGroupConfig>,
    /// Ordered rules.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// `[[access_control.networks]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkGroupConfig {
    /// Group name.
    pub name: String,
    /// IP or CIDR literals.
    #[serde(default)]
    pub networks: OneOrMany,
}

/// `[[access_control.rules]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Domains covered by the rule.
    #[serde(default)]
    pub domain: OneOrMany,
    /// Policy keyword.
    pub policy: String,
    /// Subject clauses.
    #[serde(default)]
    pub subject: SubjectConfig,
    /// Network group names or literals.
    #[serde(default)]
    pub networks: OneOrMany,
    /// Path regular expressions.
    #[serde(default)]
    pub resources: OneOrMany,
    /// HTTP methods.
    #[serde(default)]
    pub methods: OneOrMany,
}

impl RuleConfig {
    /// Normalizes the rule into a core specification.
    #[must_use]
    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec::new(self.domain.to_vec(), self.policy.trim())
            .with_subjects(self.subject.to_clauses())
            .with_networks(self.networks.to_vec())
            .with_resources(self.resources.to_vec())
            .with_methods(self.methods.to_vec())
    }
}

impl AccessControlConfig {
    /// Effective default policy keyword.
    #[must_use]
    pub fn effective_default_policy(&self) -> &str {
        let trimmed = self.default_policy.trim();
        if trimmed.is_empty() { POLICY_DENY } else { trimmed }
    }

    /// Normalized rule specifications, in order.
    #[must_use]
    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(RuleConfig::to_spec).collect()
    }

    /// Normalized network group specifications, in order.
    #[must_use]
    pub fn network_specs(&self) -> Vec<NetworkGroupSpec> {
        self.networks
            .iter()
            .map(|group| NetworkGroupSpec::new(group.name.trim(), group.networks.to_vec()))
            .collect()
    }

    /// Validates structural constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a constraint is violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Level::parse_policy(self.effective_default_policy()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "access_control.default_policy must be one of deny, two_factor, one_factor or \
                 bypass, got '{}'",
                self.effective_default_policy()
            )));
        }
        if self.rules.len() > MAX_RULES {
            return Err(ConfigError::Invalid(format!(
                "access_control.rules exceeds max of {MAX_RULES}"
            )));
        }
        if self.networks.len() > MAX_NETWORK_GROUPS {
            return Err(ConfigError::Invalid(format!(
                "access_control.networks exceeds max of {MAX_NETWORK_GROUPS}"
            )));
        }
        for (index, group) in self.networks.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "access_control.networks[{index}].name must be non-empty"
                )));
            }
        }
        for (index, rule) in self.rules.iter().enumerate() {
            validate_rule(index, rule)?;
        }
        Ok(())
    }

    /// Compiles the table into a core rule set.
    ///
    /// With `strict` set, any compile warning is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on fatal compile issues, or on any
    /// issue in strict mode.
    pub fn compile(&self) -> Result<Compilation, ConfigError> {
        let compilation = compile(
            &self.rule_specs(),
            &self.network_specs(),
            self.effective_default_policy(),
        )
        .map_err(|error| ConfigError::Invalid(join_issues(&error.errors)))?;
        if self.strict && !compilation.warnings.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "access_control.strict rejects warnings: {}",
                join_issues(&compilation.warnings)
            )));
        }
        Ok(compilation)
    }
}

/// Validates one rule.
fn validate_rule(index: usize, rule: &RuleConfig) -> Result<(), ConfigError> {
    let field = format!("access_control.rules[{index}]");
    if !rule.domain.to_vec().iter().any(|domain| !domain.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{field}.domain must list at least one domain")));
    }
    if Level::parse_policy(rule.policy.trim()).is_none() {
        return Err(ConfigError::Invalid(format!(
            "{field}.policy must be one of deny, two_factor, one_factor or bypass, got '{}'",
            rule.policy
        )));
    }
    for method in rule.methods.to_vec() {
        if !is_known_method(&method) {
            return Err(ConfigError::Invalid(format!(
                "{field}.methods contains '{method}', expected one of {}",
                KNOWN_METHODS.join(", ")
            )));
        }
    }
    let has_subjects = rule.subject.to_clauses().iter().any(|clause| !clause.is_empty());
    if rule.policy.trim() == POLICY_BYPASS && has_subjects {
        return Err(ConfigError::Invalid(format!(
            "{field} uses policy bypass and may not declare subjects"
        )));
    }
    Ok(())
}

/// Renders issues as one message.
fn join_issues(issues: &[gatehouse_core::CompileIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
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

    fn parse(toml_text: &str) -> AccessControlConfig {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn scalars_are_coerced_to_lists() {
        let config = parse(
            r#"
[[rules]]
domain = "a.example.com"
policy = "one_factor"
subject = "user:bob"
networks = "10.0.0.0/8"
methods = "get"
"#,
        );
        let spec = &config.rule_specs()[0];
        assert_eq!(spec.domains, vec!["a.example.com".to_string()]);
        assert_eq!(spec.subjects, vec![vec!["user:bob".to_string()]]);
        assert_eq!(spec.networks, vec!["10.0.0.0/8".to_string()]);
        assert_eq!(spec.methods, vec!["get".to_string()]);
    }

    #[test]
    fn subject_lists_are_or_and_nested_lists_are_and() {
        let config = parse(
            r#"
[[rules]]
domain = ["a.example.com"]
policy = "one_factor"
subject = ["user:bob", ["group:ops", "group:oncall"]]
"#,
        );
        assert_eq!(
            config.rule_specs()[0].subjects,
            vec![
                vec!["user:bob".to_string()],
                vec!["group:ops".to_string(), "group:oncall".to_string()],
            ]
        );
    }

    #[test]
    fn empty_default_policy_means_deny() {
        let config = AccessControlConfig::default();
        assert_eq!(config.effective_default_policy(), "deny");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bypass_rules_reject_subjects() {
        let config = parse(
            r#"
[[rules]]
domain = "a.example.com"
policy = "bypass"
subject = "group:admins"
"#,
        );
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("may not declare subjects"));
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let config = parse(
            r#"
[[rules]]
domain = "a.example.com"
policy = "one_factor"
methods = ["GET", "PROPFIND"]
"#,
        );
        assert!(config.validate().unwrap_err().to_string().contains("PROPFIND"));
    }

    #[test]
    fn strict_mode_escalates_warnings() {
        let mut config = parse(
            r#"
[[rules]]
domain = "a.example.com"
policy = "one_factor"
networks = ["not-a-network"]
"#,
        );
        let lenient = config.compile().unwrap();
        assert_eq!(lenient.warnings.len(), 2);
        config.strict = true;
        let error = config.compile().unwrap_err();
        assert!(error.to_string().contains("access_control.strict"));
    }
}
