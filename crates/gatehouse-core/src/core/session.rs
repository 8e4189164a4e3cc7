// crates/gatehouse-core/src/core/session.rs
// ============================================================================
// Module: Gatehouse Session Model
// Description: Session state consumed by the session gate and its decisions.
// Purpose: Define the external session record and the final access decision.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Sessions are owned by the session provider; the core only reads the
//! attained level, expiry, remembered-device flag and last activity. The
//! [`Decision`] enum is the single output handed back to the HTTP layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::level::AuthenticationLevel;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Snapshot of a caller's session.
///
/// # Invariants
/// - `expires_at` is exclusive: a session is expired once `now >= expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Attained authentication level.
    pub level: AuthenticationLevel,
    /// Absolute expiry time.
    pub expires_at: Timestamp,
    /// Whether the user asked to be remembered on this device.
    #[serde(default)]
    pub remembered: bool,
    /// Last time the session was used, when tracked.
    #[serde(default)]
    pub last_activity: Option<Timestamp>,
}

impl SessionState {
    /// Creates a session at `level` expiring at `expires_at`.
    #[must_use]
    pub const fn new(level: AuthenticationLevel, expires_at: Timestamp) -> Self {
        Self {
            level,
            expires_at,
            remembered: false,
            last_activity: None,
        }
    }

    /// Marks the session as remembered.
    #[must_use]
    pub const fn remembered(mut self) -> Self {
        self.remembered = true;
        self
    }

    /// Records the last activity time.
    #[must_use]
    pub const fn with_last_activity(mut self, at: Timestamp) -> Self {
        self.last_activity = Some(at);
        self
    }

    /// Returns true when the session has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Final access decision for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Forward the request.
    Allow,
    /// Redirect to the first-factor login flow.
    RedirectFirstFactor,
    /// Redirect to the second-factor flow.
    RedirectSecondFactor,
    /// Reject the request.
    Deny,
}

impl Decision {
    /// Returns a stable label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::RedirectFirstFactor => "redirect_first_factor",
            Self::RedirectSecondFactor => "redirect_second_factor",
            Self::Deny => "deny",
        }
    }

    /// Conventional HTTP status for the decision.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Allow => 200,
            Self::RedirectFirstFactor | Self::RedirectSecondFactor => 302,
            Self::Deny => 403,
        }
    }

    /// Returns true when the request may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
