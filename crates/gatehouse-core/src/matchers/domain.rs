// crates/gatehouse-core/src/matchers/domain.rs
// ============================================================================
// Module: Gatehouse Domain Matcher
// Description: Exact and wildcard-suffix domain patterns.
// Purpose: Match request hosts case-insensitively.
// Dependencies: none
// ============================================================================

//! ## Overview
//! `*.example.com` compiles to a wildcard whose stored name is `.example.com`,
//! so it matches `a.example.com` and `a.b.example.com` but never the apex.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SECTION: Domain Patterns
// ============================================================================

/// Compiled domain pattern.
///
/// # Invariants
/// - `name` is lowercase.
/// - For wildcards `name` starts with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainPattern {
    /// Lowercased host, or `.suffix` for wildcards.
    name: String,
    /// Whether the pattern matches by suffix.
    wildcard: bool,
}

impl DomainPattern {
    /// Compiles a configured domain entry.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.strip_prefix('*') {
            Some(suffix) if suffix.starts_with('.') => Self {
                name: suffix.to_string(),
                wildcard: true,
            },
            _ => Self {
                name: lowered,
                wildcard: false,
            },
        }
    }

    /// Returns true when `domain` is covered by the pattern.
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        if self.wildcard {
            let Some(split) = domain.len().checked_sub(self.name.len()) else {
                return false;
            };
            split > 0
                && domain.is_char_boundary(split)
                && domain[split ..].eq_ignore_ascii_case(&self.name)
        } else {
            domain.eq_ignore_ascii_case(&self.name)
        }
    }

    /// Stored name (with leading `.` for wildcards).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true for suffix patterns.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard { write!(f, "*{}", self.name) } else { f.write_str(&self.name) }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
