// crates/gatehouse-core/src/runtime/session_gate.rs
// ============================================================================
// Module: Gatehouse Session Gate
// Description: Combines a required level with the caller's session state.
// Purpose: Produce the final allow / redirect / deny decision.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The gate is a pure function of the required [`Level`], the optional
//! [`SessionState`] and a caller-supplied `now`. `Denied` always wins,
//! `Bypass` never looks at the session, and an expired or inactive session is
//! treated as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::level::AuthenticationLevel;
use crate::core::level::Level;
use crate::core::session::Decision;
use crate::core::session::SessionState;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Session validity policy applied by the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Inactivity window in milliseconds; `None` disables the check.
    pub inactivity_ms: Option<u64>,
}

impl SessionPolicy {
    /// Policy with an inactivity window.
    #[must_use]
    pub const fn with_inactivity(inactivity_ms: u64) -> Self {
        Self {
            inactivity_ms: Some(inactivity_ms),
        }
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Session gate configured with a [`SessionPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionGate {
    /// Validity policy.
    policy: SessionPolicy,
}

impl SessionGate {
    /// Creates a gate.
    #[must_use]
    pub const fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
        }
    }

    /// Returns true when `session` is neither expired nor inactive at `now`.
    #[must_use]
    pub fn is_active(&self, session: &SessionState, now: Timestamp) -> bool {
        if session.is_expired(now) {
            return false;
        }
        let Some(window) = self.policy.inactivity_ms else {
            return true;
        };
        if session.remembered {
            return true;
        }
        session.last_activity.is_some_and(|last| now.millis_since(last) <= window)
    }

    /// Decides whether the request may proceed.
    #[must_use]
    pub fn decide(
        &self,
        required: Level,
        session: Option<&SessionState>,
        now: Timestamp,
    ) -> Decision {
        match required {
            Level::Denied => return Decision::Deny,
            Level::Bypass => return Decision::Allow,
            Level::OneFactor | Level::TwoFactor => {}
        }
        let attained = session
            .filter(|session| self.is_active(session, now))
            .map_or(AuthenticationLevel::Unauthenticated, |session| session.level);
        if attained.satisfies(required) {
            Decision::Allow
        } else if attained == AuthenticationLevel::OneFactor && required == Level::TwoFactor {
            Decision::RedirectSecondFactor
        } else {
            Decision::RedirectFirstFactor
        }
    }
}

/// Session gate without an inactivity window.
#[must_use]
pub fn decide(required: Level, session: Option<&SessionState>, now: Timestamp) -> Decision {
    SessionGate::default().decide(required, session, now)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
