// crates/gatehouse-core/src/matchers/mod.rs
// ============================================================================
// Module: Gatehouse Matchers
// Description: Per-dimension matchers for compiled rules.
// Purpose: Group network, subject, domain, resource and method matching.
// Dependencies: regex, smallvec, thiserror
// ============================================================================

//! ## Overview
//! Each matcher compiles one rule dimension from its configured text form and
//! evaluates it against a request. Matchers are immutable after compilation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod domain;
pub mod method;
pub mod network;
pub mod resource;
pub mod subject;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use domain::DomainPattern;
pub use method::KNOWN_METHODS;
pub use method::MethodSet;
pub use method::is_known_method;
pub use network::GroupIssue;
pub use network::NetworkHandle;
pub use network::NetworkHandles;
pub use network::NetworkParseError;
pub use network::NetworkRange;
pub use network::NetworkResolver;
pub use network::NetworkTable;
pub use resource::ResourcePattern;
pub use subject::Subject;
pub use subject::SubjectClause;
pub use subject::SubjectKind;
pub use subject::SubjectParseError;
pub use subject::clauses_match;
