// crates/gatehouse-core/src/matchers/resource.rs
// ============================================================================
// Module: Gatehouse Resource Matcher
// Description: Compiled path regular expressions.
// Purpose: Match request paths (with query) against configured resources.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Resource patterns are unanchored regular expressions searched anywhere in
//! the request path; operators anchor them with `^` when needed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use regex::Regex;

// ============================================================================
// SECTION: Resource Patterns
// ============================================================================

/// Compiled resource pattern.
#[derive(Debug, Clone)]
pub struct ResourcePattern {
    /// Compiled expression.
    regex: Regex,
}

impl ResourcePattern {
    /// Compiles a resource pattern.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the pattern is malformed.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Returns true when `path` contains a match.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Source text of the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for ResourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ResourcePattern {}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
