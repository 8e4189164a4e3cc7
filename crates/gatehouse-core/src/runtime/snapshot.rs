// crates/gatehouse-core/src/runtime/snapshot.rs
// ============================================================================
// Module: Gatehouse Rule-Set Snapshots
// Description: Atomic publication of compiled rule sets.
// Purpose: Let reloads swap rules without disturbing in-flight evaluations.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`RuleSetHandle`] owns the currently published [`RuleSetSnapshot`].
//! Readers clone the `Arc` and evaluate without holding the lock; a reload
//! swaps the pointer and bumps the generation. Requests that pinned the old
//! snapshot finish against it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::runtime::engine::RuleSet;

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// One published rule set.
#[derive(Debug)]
pub struct RuleSetSnapshot {
    /// Publication counter, starting at 1.
    generation: u64,
    /// Compiled rules.
    rule_set: RuleSet,
}

impl RuleSetSnapshot {
    /// Publication counter.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Compiled rules.
    #[must_use]
    pub const fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Shared slot holding the current snapshot.
///
/// # Invariants
/// - Generations strictly increase across [`RuleSetHandle::replace`] calls.
/// - The lock is held only for the pointer read or swap, never for evaluation.
#[derive(Debug)]
pub struct RuleSetHandle {
    /// Current snapshot.
    current: RwLock<Arc<RuleSetSnapshot>>,
}

impl RuleSetHandle {
    /// Publishes `rule_set` as generation 1.
    #[must_use]
    pub fn new(rule_set: RuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(RuleSetSnapshot {
                generation: 1,
                rule_set,
            })),
        }
    }

    /// Pins the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSetSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publishes `rule_set` and returns its generation.
    pub fn replace(&self, rule_set: RuleSet) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = guard.generation.saturating_add(1);
        *guard = Arc::new(RuleSetSnapshot {
            generation,
            rule_set,
        });
        generation
    }

    /// Generation of the current snapshot.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
