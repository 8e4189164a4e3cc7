// crates/gatehouse-core/src/core/level.rs
// ============================================================================
// Module: Gatehouse Authentication Levels
// Description: Required policy levels and attained session levels.
// Purpose: Provide the comparison scale shared by the engine and session gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Policies compile into a [`Level`]. `Bypass`, `OneFactor` and `TwoFactor`
//! form an ordered scale; `Denied` sits outside it and is never satisfiable.
//! Sessions report an [`AuthenticationLevel`], which is compared against a
//! required [`Level`] through [`AuthenticationLevel::satisfies`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Policy Keywords
// ============================================================================

/// Policy keyword for [`Level::Bypass`].
pub const POLICY_BYPASS: &str = "bypass";
/// Policy keyword for [`Level::OneFactor`].
pub const POLICY_ONE_FACTOR: &str = "one_factor";
/// Policy keyword for [`Level::TwoFactor`].
pub const POLICY_TWO_FACTOR: &str = "two_factor";
/// Policy keyword for [`Level::Denied`].
pub const POLICY_DENY: &str = "deny";

// ============================================================================
// SECTION: Required Level
// ============================================================================

/// Authentication strength a rule requires.
///
/// # Invariants
/// - `Bypass < OneFactor < TwoFactor`.
/// - `Denied` compares equal only to itself; every other comparison with it is
///   `None`, so `>=` and `<=` against `Denied` are always false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// No authentication required.
    Bypass,
    /// A first factor (password) is required.
    OneFactor,
    /// A first and a second factor are required.
    TwoFactor,
    /// Never satisfiable by any authentication.
    #[serde(rename = "deny")]
    Denied,
}

impl Level {
    /// Parses a policy keyword, returning `None` for unknown keywords.
    #[must_use]
    pub fn parse_policy(policy: &str) -> Option<Self> {
        match policy {
            POLICY_BYPASS => Some(Self::Bypass),
            POLICY_ONE_FACTOR => Some(Self::OneFactor),
            POLICY_TWO_FACTOR => Some(Self::TwoFactor),
            POLICY_DENY => Some(Self::Denied),
            _ => None,
        }
    }

    /// Converts a policy keyword to a level, failing closed to `Denied`.
    #[must_use]
    pub fn from_policy(policy: &str) -> Self {
        Self::parse_policy(policy).unwrap_or(Self::Denied)
    }

    /// Returns the policy keyword for this level.
    #[must_use]
    pub const fn as_policy(self) -> &'static str {
        match self {
            Self::Bypass => POLICY_BYPASS,
            Self::OneFactor => POLICY_ONE_FACTOR,
            Self::TwoFactor => POLICY_TWO_FACTOR,
            Self::Denied => POLICY_DENY,
        }
    }

    /// Position on the ordered scale, `None` for `Denied`.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Bypass => Some(0),
            Self::OneFactor => Some(1),
            Self::TwoFactor => Some(2),
            Self::Denied => None,
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.rank(), other.rank()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_policy())
    }
}

// ============================================================================
// SECTION: Attained Level
// ============================================================================

/// Authentication strength a session has attained.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationLevel {
    /// Session exists but no factor has been verified.
    #[default]
    Unauthenticated,
    /// First factor verified.
    OneFactor,
    /// First and second factor verified.
    TwoFactor,
}

impl AuthenticationLevel {
    /// Returns true when this attained level meets `required`.
    #[must_use]
    pub const fn satisfies(self, required: Level) -> bool {
        match required {
            Level::Bypass => true,
            Level::OneFactor => matches!(self, Self::OneFactor | Self::TwoFactor),
            Level::TwoFactor => matches!(self, Self::TwoFactor),
            Level::Denied => false,
        }
    }

    /// Returns a stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::OneFactor => "one_factor",
            Self::TwoFactor => "two_factor",
        }
    }
}

impl fmt::Display for AuthenticationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
