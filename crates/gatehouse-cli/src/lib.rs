// crates/gatehouse-cli/src/lib.rs
// ============================================================================
// Module: Gatehouse CLI Library
// Description: Shared helpers for the Gatehouse command-line interface.
// Purpose: Keep input parsing and rendering reusable by the binary and tests.
// Dependencies: gatehouse-core, serde, thiserror, time, url
// ============================================================================

//! ## Overview
//! Helpers behind the `gatehouse` binary: parsing `check` inputs into engine
//! requests and sessions, and rendering reports and rule tables.
//!
//! Security posture: CLI inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Request, session and report helpers for `gatehouse check`.
pub mod check;
/// Rule table rendering for `gatehouse rules`.
pub mod rules;
