// crates/gatehouse-core/src/core/request.rs
// ============================================================================
// Module: Gatehouse Request Context
// Description: Per-request inputs to the decision engine.
// Purpose: Describe the target and caller of a proxied request.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RequestContext`] is built by the HTTP-handling layer for every forwarded
//! request. The engine borrows it; nothing here is owned by the rule set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Verified identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Username as reported by the authentication backend.
    pub username: String,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Identity {
    /// Creates an identity from a username and group list.
    #[must_use]
    pub fn new(username: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            username: username.into(),
            groups,
        }
    }

    /// Returns true when the identity belongs to `group`.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|candidate| candidate == group)
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Request descriptor evaluated against the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Target domain (host without port).
    pub domain: String,
    /// Request path, optionally including the query string.
    pub path: String,
    /// HTTP method token.
    pub method: String,
    /// Client source address.
    pub source: IpAddr,
    /// Identity of the caller, absent for anonymous requests.
    pub identity: Option<Identity>,
}

impl RequestContext {
    /// Creates an anonymous request context.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
        source: IpAddr,
    ) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
            method: method.into(),
            source,
            identity: None,
        }
    }

    /// Attaches an identity to the request.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Returns true when no identity is attached.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }
}
