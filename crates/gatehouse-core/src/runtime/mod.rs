// crates/gatehouse-core/src/runtime/mod.rs
// ============================================================================
// Module: Gatehouse Runtime
// Description: Rule compilation, evaluation, session gating and snapshots.
// Purpose: Turn specifications into decisions.
// Dependencies: regex, serde, thiserror
// ============================================================================

//! ## Overview
//! The runtime compiles specifications into a [`RuleSet`], evaluates requests
//! against it and gates the result on session state. Published rule sets live
//! behind a [`RuleSetHandle`] so reloads are atomic.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod compiler;
pub mod engine;
pub mod session_gate;
pub mod snapshot;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compiler::Compilation;
pub use compiler::CompileError;
pub use compiler::CompileIssue;
pub use compiler::compile;
pub use engine::Evaluation;
pub use engine::Rule;
pub use engine::RuleSet;
pub use engine::required_level;
pub use session_gate::SessionGate;
pub use session_gate::SessionPolicy;
pub use session_gate::decide;
pub use snapshot::RuleSetHandle;
pub use snapshot::RuleSetSnapshot;
