// crates/gatehouse-core/src/audit.rs
// ============================================================================
// Module: Gatehouse Audit Logging
// Description: Structured audit events for access decisions and reloads.
// Purpose: Emit JSON-lines audit records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every decision made through the access gate produces one
//! [`DecisionAuditEvent`]; every rule-set publication produces one
//! [`ReloadAuditEvent`]. Sinks serialize events as single JSON lines so
//! deployments can route them to whatever pipeline they run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::core::level::Level;
use crate::core::request::RequestContext;
use crate::core::session::Decision;
use crate::core::time::Timestamp;
use crate::runtime::engine::Evaluation;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event for one access decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Decision time (milliseconds since epoch, caller-supplied).
    pub timestamp_ms: i64,
    /// Generation of the snapshot that decided.
    pub generation: u64,
    /// Target domain.
    pub domain: String,
    /// Request path.
    pub path: String,
    /// HTTP method.
    pub method: String,
    /// Client address.
    pub source_ip: String,
    /// Authenticated username, when present.
    pub username: Option<String>,
    /// Index of the deciding rule; `None` when the default applied.
    pub matched_rule: Option<usize>,
    /// Required level.
    pub required: Level,
    /// Final decision.
    pub decision: Decision,
}

impl DecisionAuditEvent {
    /// Builds an event from a request and its outcome.
    #[must_use]
    pub fn new(
        generation: u64,
        request: &RequestContext,
        evaluation: Evaluation,
        decision: Decision,
        now: Timestamp,
    ) -> Self {
        Self {
            event: "access_decision",
            timestamp_ms: now.as_unix_millis(),
            generation,
            domain: request.domain.clone(),
            path: request.path.clone(),
            method: request.method.clone(),
            source_ip: request.source.to_string(),
            username: request.identity.as_ref().map(|identity| identity.username.clone()),
            matched_rule: evaluation.matched_rule,
            required: evaluation.level,
            decision,
        }
    }
}

/// Audit event for a rule-set publication.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Publication time (milliseconds since epoch, caller-supplied).
    pub timestamp_ms: i64,
    /// New generation.
    pub generation: u64,
    /// Number of compiled rules.
    pub rules: usize,
    /// Number of compile warnings.
    pub warnings: usize,
}

impl ReloadAuditEvent {
    /// Builds a publication event.
    #[must_use]
    pub const fn new(generation: u64, rules: usize, warnings: usize, now: Timestamp) -> Self {
        Self {
            event: "rule_set_published",
            timestamp_ms: now.as_unix_millis(),
            generation,
            rules,
            warnings,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for access-control events.
pub trait AuditSink: Send + Sync {
    /// Record a decision event.
    fn record(&self, event: &DecisionAuditEvent);

    /// Record a reload event.
    fn record_reload(&self, _event: &ReloadAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        write_stderr(event);
    }

    fn record_reload(&self, event: &ReloadAuditEvent) {
        write_stderr(event);
    }
}

/// Serializes `event` as one stderr line.
fn write_stderr<T: Serialize>(event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(io::stderr(), "{payload}");
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends `event` as one line and flushes.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        self.append(event);
    }

    fn record_reload(&self, event: &ReloadAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
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

    use std::net::IpAddr;

    use super::*;
    use crate::core::request::Identity;

    #[test]
    fn file_sink_appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::new(&path).unwrap();
        let request = RequestContext::new(
            "secure.example.com",
            "/admin",
            "GET",
            "10.0.0.4".parse::<IpAddr>().unwrap(),
        )
        .with_identity(Identity::new("bob", Vec::new()));
        let evaluation = Evaluation {
            level: Level::TwoFactor,
            matched_rule: Some(1),
        };
        let now = Timestamp::from_unix_millis(42);
        sink.record(&DecisionAuditEvent::new(3, &request, evaluation, Decision::Deny, now));
        sink.record_reload(&ReloadAuditEvent::new(4, 2, 0, now));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let decision: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(decision["event"], "access_decision");
        assert_eq!(decision["timestamp_ms"], 42);
        assert_eq!(decision["required"], "two_factor");
        assert_eq!(decision["decision"], "deny");
        assert_eq!(decision["username"], "bob");
        assert_eq!(decision["matched_rule"], 1);
        let reload: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(reload["event"], "rule_set_published");
        assert_eq!(reload["generation"], 4);
    }
}
