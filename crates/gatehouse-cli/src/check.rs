// crates/gatehouse-cli/src/check.rs
// ============================================================================
// Module: Offline Check Helpers
// Description: Turns command-line inputs into engine requests and reports.
// Purpose: Keep argument parsing testable outside the binary entry point.
// Dependencies: gatehouse-core, serde, thiserror, time, url
// ============================================================================

//! ## Overview
//! `gatehouse check` evaluates one request without a running proxy. The target
//! domain is the URL host and the path is the URL path plus the query string.
//! Timestamps are RFC 3339 and are converted to the engine's millisecond clock
//! here, so the engine itself never reads the wall clock.
//!
//! Security posture: every input is untrusted and parsed fail-closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::net::IpAddr;

use gatehouse_core::AccessOutcome;
use gatehouse_core::AuthenticationLevel;
use gatehouse_core::Decision;
use gatehouse_core::Level;
use gatehouse_core::RequestContext;
use gatehouse_core::SessionState;
use gatehouse_core::Timestamp;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Invalid `check` input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckInputError {
    /// The URL does not parse.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// Raw URL.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// The URL carries no host to match domains against.
    #[error("url {url} has no host")]
    MissingHost {
        /// Raw URL.
        url: String,
    },
    /// The source address is not an IP literal.
    #[error("invalid source ip {value}")]
    InvalidSource {
        /// Raw value.
        value: String,
    },
    /// The timestamp is not RFC 3339.
    #[error("invalid timestamp {value}: expected RFC 3339")]
    InvalidTimestamp {
        /// Raw value.
        value: String,
    },
    /// The timestamp does not fit the millisecond clock.
    #[error("timestamp {value} is out of range")]
    TimestampOutOfRange {
        /// Raw value.
        value: String,
    },
}

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Domain and path extracted from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Lowercase host without port.
    pub domain: String,
    /// Path plus `?query` when present.
    pub path: String,
}

/// Parses the URL given to `--url`.
///
/// # Errors
///
/// Returns [`CheckInputError`] when the URL is malformed or has no host.
pub fn parse_target(raw: &str) -> Result<Target, CheckInputError> {
    let url = Url::parse(raw).map_err(|err| CheckInputError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    let host = url.host_str().filter(|host| !host.is_empty()).ok_or_else(|| {
        CheckInputError::MissingHost {
            url: raw.to_string(),
        }
    })?;
    let domain = host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase();
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Ok(Target {
        domain,
        path,
    })
}

/// Parses the `--ip` source address.
///
/// # Errors
///
/// Returns [`CheckInputError::InvalidSource`] for anything but an IP literal.
pub fn parse_source(raw: &str) -> Result<IpAddr, CheckInputError> {
    raw.trim().parse::<IpAddr>().map_err(|_| CheckInputError::InvalidSource {
        value: raw.to_string(),
    })
}

// ============================================================================
// SECTION: Time
// ============================================================================

/// Parses an RFC 3339 timestamp into engine time.
///
/// # Errors
///
/// Returns [`CheckInputError`] when the value is not RFC 3339 or overflows.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, CheckInputError> {
    let parsed = OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| {
        CheckInputError::InvalidTimestamp {
            value: raw.to_string(),
        }
    })?;
    to_timestamp(parsed).ok_or_else(|| CheckInputError::TimestampOutOfRange {
        value: raw.to_string(),
    })
}

/// Current wall-clock time in engine units.
///
/// # Errors
///
/// Returns [`CheckInputError::TimestampOutOfRange`] if the clock overflows.
pub fn current_timestamp() -> Result<Timestamp, CheckInputError> {
    to_timestamp(OffsetDateTime::now_utc()).ok_or_else(|| CheckInputError::TimestampOutOfRange {
        value: "now".to_string(),
    })
}

/// Renders engine time as RFC 3339, falling back to raw milliseconds.
#[must_use]
pub fn format_timestamp(at: Timestamp) -> String {
    let millis = at.as_unix_millis();
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

/// Converts a datetime to whole milliseconds since the epoch.
fn to_timestamp(value: OffsetDateTime) -> Option<Timestamp> {
    i64::try_from(value.unix_timestamp_nanos() / 1_000_000).ok().map(Timestamp::from_unix_millis)
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Session flags collected from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInput {
    /// Attained level; `Unauthenticated` means no session.
    pub level: AuthenticationLevel,
    /// Explicit expiry.
    pub expires_at: Option<Timestamp>,
    /// Remember-me flag.
    pub remembered: bool,
    /// Last activity; defaults to `now`.
    pub last_activity: Option<Timestamp>,
}

impl SessionInput {
    /// Builds the session state, or `None` for an anonymous caller.
    ///
    /// Without `expires_at` the session expires `lifetime_ms` after `now`.
    #[must_use]
    pub fn to_state(&self, now: Timestamp, lifetime_ms: u64) -> Option<SessionState> {
        if self.level == AuthenticationLevel::Unauthenticated {
            return None;
        }
        let expires_at = self.expires_at.unwrap_or_else(|| now.saturating_add_millis(lifetime_ms));
        let state = SessionState::new(self.level, expires_at)
            .with_last_activity(self.last_activity.unwrap_or(now));
        Some(if self.remembered { state.remembered() } else { state })
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Result of `gatehouse check`, serialized for `--format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Evaluated domain.
    pub domain: String,
    /// Evaluated path.
    pub path: String,
    /// Evaluated method.
    pub method: String,
    /// Client source address.
    pub source_ip: IpAddr,
    /// Username, when an identity was supplied.
    pub username: Option<String>,
    /// Required level.
    pub required: Level,
    /// Index of the deciding rule; `None` when the default applied.
    pub matched_rule: Option<usize>,
    /// Final decision.
    pub decision: Decision,
    /// Conventional HTTP status for the decision.
    pub http_status: u16,
    /// Evaluation time as RFC 3339.
    pub evaluated_at: String,
}

impl CheckReport {
    /// Builds a report for one evaluated request.
    #[must_use]
    pub fn new(request: &RequestContext, outcome: &AccessOutcome, now: Timestamp) -> Self {
        Self {
            domain: request.domain.clone(),
            path: request.path.clone(),
            method: request.method.clone(),
            source_ip: request.source,
            username: request.identity.as_ref().map(|identity| identity.username.clone()),
            required: outcome.evaluation.level,
            matched_rule: outcome.evaluation.matched_rule,
            decision: outcome.decision,
            http_status: outcome.decision.http_status(),
            evaluated_at: format_timestamp(now),
        }
    }

    /// Human-readable multi-line rendering.
    #[must_use]
    pub fn render_text(&self) -> String {
        let matched =
            self.matched_rule.map_or_else(|| "default policy".to_string(), |index| format!("#{index}"));
        let mut text = String::new();
        let _ = writeln!(text, "target: {}{}", self.domain, self.path);
        let _ = writeln!(text, "method: {}", self.method);
        let _ = writeln!(text, "source ip: {}", self.source_ip);
        let _ = writeln!(text, "user: {}", self.username.as_deref().unwrap_or("<anonymous>"));
        let _ = writeln!(text, "required: {}", self.required);
        let _ = writeln!(text, "matched rule: {matched}");
        let _ = write!(text, "decision: {} ({})", self.decision, self.http_status);
        text
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
