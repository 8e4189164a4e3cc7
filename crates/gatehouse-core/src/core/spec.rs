// crates/gatehouse-core/src/core/spec.rs
// ============================================================================
// Module: Gatehouse Access-Control Specifications
// Description: Raw, uncompiled rule and network-group records.
// Purpose: Define the loader-facing input accepted by the rule compiler.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Specifications are the plain-text form of the access-control table after the
//! configuration loader has coerced scalars into lists. The compiler borrows
//! them and never mutates them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Network Groups
// ============================================================================

/// Named group of network literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkGroupSpec {
    /// Unique group name referenced from rules.
    pub name: String,
    /// IP or CIDR literals.
    #[serde(default)]
    pub networks: Vec<String>,
}

impl NetworkGroupSpec {
    /// Creates a network group spec.
    #[must_use]
    pub fn new(name: impl Into<String>, networks: Vec<String>) -> Self {
        Self {
            name: name.into(),
            networks,
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One raw access-control rule, in declaration order.
///
/// # Invariants
/// - Empty lists mean "no constraint" for that dimension.
/// - `subjects` is an OR of clauses; each clause is an AND of `user:`/`group:` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Domain names; a leading `*.` marks a wildcard suffix.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Policy keyword.
    pub policy: String,
    /// Subject clauses.
    #[serde(default)]
    pub subjects: Vec<Vec<String>>,
    /// Network group names or IP/CIDR literals.
    #[serde(default)]
    pub networks: Vec<String>,
    /// Path regular expressions.
    #[serde(default)]
    pub resources: Vec<String>,
    /// HTTP methods.
    #[serde(default)]
    pub methods: Vec<String>,
}

impl RuleSpec {
    /// Creates a rule covering `domains` with `policy` and no other constraints.
    #[must_use]
    pub fn new<I, S>(domains: I, policy: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            policy: policy.into(),
            ..Self::default()
        }
    }

    /// Replaces the subject clauses.
    #[must_use]
    pub fn with_subjects(mut self, subjects: Vec<Vec<String>>) -> Self {
        self.subjects = subjects;
        self
    }

    /// Replaces the network references.
    #[must_use]
    pub fn with_networks(mut self, networks: Vec<String>) -> Self {
        self.networks = networks;
        self
    }

    /// Replaces the resource patterns.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    /// Replaces the methods.
    #[must_use]
    pub fn with_methods(mut self, methods: Vec<String>) -> Self {
        self.methods = methods;
        self
    }
}
