// crates/gatehouse-core/src/lib.rs
// ============================================================================
// Module: Gatehouse Core Library
// Description: Public API surface for the Gatehouse access-control engine.
// Purpose: Expose core types, matchers, runtime and audit helpers.
// Dependencies: crate::{core, matchers, runtime, audit, access}
// ============================================================================

//! ## Overview
//! Gatehouse core compiles a declarative access-control table into immutable
//! matchers, evaluates requests against it with first-match-wins semantics,
//! and combines the required level with a caller's session into a final
//! allow, redirect or deny decision. It performs no I/O beyond the optional
//! audit file sink and never reads the wall clock.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod audit;
pub mod core;
pub mod matchers;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use access::AccessGate;
pub use access::AccessOutcome;
pub use audit::AuditSink;
pub use audit::DecisionAuditEvent;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ReloadAuditEvent;
pub use audit::StderrAuditSink;
pub use matchers::NetworkParseError;
pub use matchers::NetworkRange;
pub use runtime::Compilation;
pub use runtime::CompileError;
pub use runtime::CompileIssue;
pub use runtime::Evaluation;
pub use runtime::Rule;
pub use runtime::RuleSet;
pub use runtime::RuleSetHandle;
pub use runtime::RuleSetSnapshot;
pub use runtime::SessionGate;
pub use runtime::SessionPolicy;
pub use runtime::compile;
pub use runtime::decide;
pub use runtime::required_level;
