// crates/gatehouse-core/src/access.rs
// ============================================================================
// Module: Gatehouse Access Gate
// Description: Per-process facade over snapshots, engine, gate and audit.
// Purpose: Give the HTTP layer one call per request and one call per reload.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`AccessGate`] pins one rule-set snapshot per request, evaluates the
//! required level, applies the session gate and records an audit event. It
//! is `Send + Sync` and meant to be shared behind an `Arc`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::audit::AuditSink;
use crate::audit::DecisionAuditEvent;
use crate::audit::NoopAuditSink;
use crate::audit::ReloadAuditEvent;
use crate::core::request::RequestContext;
use crate::core::session::Decision;
use crate::core::session::SessionState;
use crate::core::time::Timestamp;
use crate::runtime::engine::Evaluation;
use crate::runtime::engine::RuleSet;
use crate::runtime::session_gate::SessionGate;
use crate::runtime::snapshot::RuleSetHandle;
use crate::runtime::snapshot::RuleSetSnapshot;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of one gated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessOutcome {
    /// Generation of the snapshot that decided.
    pub generation: u64,
    /// Engine evaluation.
    pub evaluation: Evaluation,
    /// Final decision.
    pub decision: Decision,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Shared access-control entry point.
pub struct AccessGate {
    /// Published rule sets.
    rules: RuleSetHandle,
    /// Session validity policy.
    sessions: SessionGate,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl AccessGate {
    /// Creates a gate publishing `rule_set` as generation 1, without auditing.
    #[must_use]
    pub fn new(rule_set: RuleSet, sessions: SessionGate) -> Self {
        Self::with_audit(rule_set, sessions, Arc::new(NoopAuditSink))
    }

    /// Creates a gate that records events to `audit`.
    #[must_use]
    pub fn with_audit(rule_set: RuleSet, sessions: SessionGate, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            rules: RuleSetHandle::new(rule_set),
            sessions,
            audit,
        }
    }

    /// Decides a request against the current snapshot.
    #[must_use]
    pub fn check(
        &self,
        request: &RequestContext,
        session: Option<&SessionState>,
        now: Timestamp,
    ) -> AccessOutcome {
        let snapshot = self.rules.snapshot();
        let evaluation = snapshot.rule_set().evaluate(request);
        let decision = self.sessions.decide(evaluation.level, session, now);
        self.audit.record(&DecisionAuditEvent::new(
            snapshot.generation(),
            request,
            evaluation,
            decision,
            now,
        ));
        AccessOutcome {
            generation: snapshot.generation(),
            evaluation,
            decision,
        }
    }

    /// Publishes a new rule set and returns its generation.
    pub fn reload(&self, rule_set: RuleSet, warnings: usize, now: Timestamp) -> u64 {
        let rules = rule_set.len();
        let generation = self.rules.replace(rule_set);
        self.audit.record_reload(&ReloadAuditEvent::new(generation, rules, warnings, now));
        generation
    }

    /// Pins the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSetSnapshot> {
        self.rules.snapshot()
    }

    /// Session gate in use.
    #[must_use]
    pub const fn sessions(&self) -> &SessionGate {
        &self.sessions
    }
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
    use std::sync::Mutex;

    use super::*;
    use crate::core::level::AuthenticationLevel;
    use crate::core::level::Level;
    use crate::core::spec::RuleSpec;
    use crate::runtime::compiler::compile;

    #[derive(Default)]
    struct Recorder {
        decisions: Mutex<Vec<DecisionAuditEvent>>,
        reloads: Mutex<Vec<ReloadAuditEvent>>,
    }

    impl AuditSink for Recorder {
        fn record(&self, event: &DecisionAuditEvent) {
            self.decisions.lock().unwrap().push(event.clone());
        }

        fn record_reload(&self, event: &ReloadAuditEvent) {
            self.reloads.lock().unwrap().push(event.clone());
        }
    }

    fn rule_set(policy: &str) -> RuleSet {
        compile(&[RuleSpec::new(["app.example.com"], policy)], &[], "deny").unwrap().rule_set
    }

    #[test]
    fn check_gates_and_audits() {
        let recorder = Arc::new(Recorder::default());
        let gate = AccessGate::with_audit(rule_set("two_factor"), SessionGate::default(), recorder.clone());
        let now = Timestamp::from_unix_millis(1_000);
        let session = SessionState::new(AuthenticationLevel::OneFactor, Timestamp::from_unix_millis(5_000));
        let request =
            RequestContext::new("app.example.com", "/", "GET", "10.0.0.1".parse::<IpAddr>().unwrap());

        let outcome = gate.check(&request, Some(&session), now);
        assert_eq!(outcome.decision, Decision::RedirectSecondFactor);
        assert_eq!(outcome.evaluation.level, Level::TwoFactor);
        assert_eq!(outcome.generation, 1);

        let events = recorder.decisions.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].decision, Decision::RedirectSecondFactor);
        assert_eq!(events[0].matched_rule, Some(0));
    }

    #[test]
    fn reload_switches_new_requests_and_audits() {
        let recorder = Arc::new(Recorder::default());
        let gate = AccessGate::with_audit(rule_set("deny"), SessionGate::default(), recorder.clone());
        let now = Timestamp::from_unix_millis(0);
        let request =
            RequestContext::new("app.example.com", "/", "GET", "10.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(gate.check(&request, None, now).decision, Decision::Deny);

        assert_eq!(gate.reload(rule_set("bypass"), 0, now), 2);
        let outcome = gate.check(&request, None, now);
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.generation, 2);
        assert_eq!(recorder.reloads.lock().unwrap()[0].generation, 2);
    }
}
