// crates/gatehouse-core/src/core/mod.rs
// ============================================================================
// Module: Gatehouse Core Types
// Description: Levels, request context, session records and timestamps.
// Purpose: Provide the stable vocabulary shared by compiler, engine and gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what flows into and out of the decision engine. They
//! carry no matching logic of their own.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod level;
pub mod request;
pub mod session;
pub mod spec;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use level::AuthenticationLevel;
pub use level::Level;
pub use level::POLICY_BYPASS;
pub use level::POLICY_DENY;
pub use level::POLICY_ONE_FACTOR;
pub use level::POLICY_TWO_FACTOR;
pub use request::Identity;
pub use request::RequestContext;
pub use session::Decision;
pub use session::SessionState;
pub use spec::NetworkGroupSpec;
pub use spec::RuleSpec;
pub use time::Timestamp;
