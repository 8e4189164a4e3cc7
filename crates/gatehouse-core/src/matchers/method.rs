// crates/gatehouse-core/src/matchers/method.rs
// ============================================================================
// Module: Gatehouse Method Matcher
// Description: Uppercased HTTP method sets.
// Purpose: Match request methods case-insensitively.
// Dependencies: smallvec
// ============================================================================

//! ## Overview
//! Methods are uppercased at compile time; request methods are compared with
//! ASCII case folding so `get` and `GET` are equivalent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use smallvec::SmallVec;

// ============================================================================
// SECTION: Known Methods
// ============================================================================

/// HTTP methods accepted in configuration.
pub const KNOWN_METHODS: [&str; 9] =
    ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "TRACE", "CONNECT", "OPTIONS"];

/// Returns true when `method` is one of [`KNOWN_METHODS`], ignoring case.
#[must_use]
pub fn is_known_method(method: &str) -> bool {
    KNOWN_METHODS.iter().any(|known| known.eq_ignore_ascii_case(method.trim()))
}

// ============================================================================
// SECTION: Method Sets
// ============================================================================

/// Uppercased method tokens; empty means any method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    /// Deduplicated uppercase tokens in declaration order.
    methods: SmallVec<[String; 4]>,
}

impl MethodSet {
    /// Builds a set from configured tokens.
    #[must_use]
    pub fn new<S: AsRef<str>>(methods: &[S]) -> Self {
        let mut set = Self::default();
        for method in methods {
            let token = method.as_ref().trim().to_ascii_uppercase();
            if !token.is_empty() && !set.methods.contains(&token) {
                set.methods.push(token);
            }
        }
        set
    }

    /// Returns true when the set is empty or contains `method`.
    #[must_use]
    pub fn matches(&self, method: &str) -> bool {
        self.methods.is_empty()
            || self.methods.iter().any(|candidate| candidate.eq_ignore_ascii_case(method))
    }

    /// Tokens in the set.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Returns true when no method is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
