// crates/gatehouse-config/src/lib.rs
// ============================================================================
// Module: Gatehouse Config Library
// Description: Canonical config model, validation and rule-set compilation.
// Purpose: Single source of truth for gatehouse.toml semantics.
// Dependencies: gatehouse-core, serde, serde_yaml, toml
// ============================================================================

//! ## Overview
//! `gatehouse-config` defines the canonical configuration model for
//! Gatehouse. It coerces operator-friendly scalars into lists, applies strict
//! fail-closed validation, and compiles the access-control table through
//! `gatehouse-core`.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access_control;
pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access_control::*;
pub use config::*;
pub use examples::config_toml_example;
