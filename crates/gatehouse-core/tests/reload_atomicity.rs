// crates/gatehouse-core/tests/reload_atomicity.rs
// ============================================================================
// Module: Reload Atomicity Tests
// Description: Concurrent evaluation while rule sets are republished.
// Purpose: Ensure each evaluation observes exactly one snapshot.
// Dependencies: gatehouse-core
// ============================================================================

//! Concurrency tests for rule-set publication.
//!
//! Every published generation uses one uniform policy across all of its rules,
//! so a call that mixed two snapshots would observe a policy that disagrees
//! with the generation it reported.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;

use gatehouse_core::AccessGate;
use gatehouse_core::Level;
use gatehouse_core::RequestContext;
use gatehouse_core::RuleSet;
use gatehouse_core::RuleSetHandle;
use gatehouse_core::RuleSpec;
use gatehouse_core::SessionGate;
use gatehouse_core::Timestamp;
use gatehouse_core::compile;

/// Policy used by every rule of a given generation.
fn policy_for(generation: u64) -> &'static str {
    if generation % 2 == 1 { "one_factor" } else { "two_factor" }
}

fn level_for(generation: u64) -> Level {
    if generation % 2 == 1 { Level::OneFactor } else { Level::TwoFactor }
}

fn uniform_rule_set(generation: u64) -> RuleSet {
    let policy = policy_for(generation);
    let rules: Vec<RuleSpec> = (0 .. 32)
        .map(|index| RuleSpec::new([format!("host{index}.example.com")], policy))
        .chain(std::iter::once(RuleSpec::new(["*.example.com"], policy)))
        .collect();
    compile(&rules, &[], policy).unwrap().rule_set
}

fn sample_request() -> RequestContext {
    RequestContext::new("zzz.example.com", "/", "GET", "10.0.0.1".parse::<IpAddr>().unwrap())
}

#[test]
fn evaluations_never_mix_snapshots() {
    let handle = Arc::new(RuleSetHandle::new(uniform_rule_set(1)));
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0 .. 4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let request = sample_request();
                let mut observed = 0_u64;
                while !stop.load(Ordering::Relaxed) {
                    let snapshot = handle.snapshot();
                    let evaluation = snapshot.rule_set().evaluate(&request);
                    assert_eq!(evaluation.level, level_for(snapshot.generation()));
                    for rule in snapshot.rule_set().rules() {
                        assert_eq!(rule.policy(), level_for(snapshot.generation()));
                    }
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    for generation in 2 ..= 200 {
        assert_eq!(handle.replace(uniform_rule_set(generation)), generation);
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(handle.generation(), 200);
}

#[test]
fn access_gate_reports_generation_consistent_levels() {
    let gate = Arc::new(AccessGate::new(uniform_rule_set(1), SessionGate::default()));
    let now = Timestamp::from_unix_millis(0);
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let gate = Arc::clone(&gate);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let request = sample_request();
            while !stop.load(Ordering::Relaxed) {
                let outcome = gate.check(&request, None, now);
                assert_eq!(outcome.evaluation.level, level_for(outcome.generation));
            }
        })
    };

    for generation in 2 ..= 100 {
        gate.reload(uniform_rule_set(generation), 0, now);
    }
    stop.store(true, Ordering::Relaxed);
    reader.join().unwrap();
    assert_eq!(gate.snapshot().generation(), 100);
}
