// crates/gatehouse-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and request construction.
// Purpose: Ensure CLI flags map onto engine inputs without surprises.
// Dependencies: clap, gatehouse-core
// ============================================================================

//! ## Overview
//! Validates the clap definitions and the `check` request builder.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::CommandFactory;
use clap::Parser;
use gatehouse_core::AuthenticationLevel;

use super::CheckCommand;
use super::Cli;
use super::Commands;
use super::OutputFormat;
use super::SessionLevelArg;
use super::build_request;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn parse_check(args: &[&str]) -> CheckCommand {
    let mut argv = vec!["gatehouse", "check"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Some(Commands::Check(command)) => *command,
        _ => panic!("expected check command"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn check_defaults_to_anonymous_get_from_loopback() {
    let command = parse_check(&["--url", "https://app.example.com/"]);
    assert_eq!(command.method, "GET");
    assert_eq!(command.ip, "127.0.0.1");
    assert_eq!(command.session_level, SessionLevelArg::None);
    assert_eq!(command.format, OutputFormat::Text);
    assert!(!command.remembered);
    let request = build_request(&command).unwrap();
    assert!(request.is_anonymous());
    assert_eq!(request.domain, "app.example.com");
}

#[test]
fn check_accepts_snake_case_session_levels() {
    let command = parse_check(&[
        "--url",
        "https://app.example.com/",
        "--session-level",
        "two_factor",
        "--format",
        "json",
    ]);
    assert_eq!(AuthenticationLevel::from(command.session_level), AuthenticationLevel::TwoFactor);
    assert_eq!(command.format, OutputFormat::Json);
}

#[test]
fn check_groups_require_a_user() {
    let result = Cli::try_parse_from([
        "gatehouse",
        "check",
        "--url",
        "https://app.example.com/",
        "--group",
        "dev",
    ]);
    assert!(result.is_err());
}

#[test]
fn build_request_attaches_identity_and_normalizes_method() {
    let command = parse_check(&[
        "--url",
        "https://dev.example.com/groups/dev/x?y=1",
        "--method",
        "post",
        "--ip",
        "10.1.2.3",
        "--user",
        "john",
        "--group",
        "dev",
        "--group",
        "admins",
    ]);
    let request = build_request(&command).unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/groups/dev/x?y=1");
    let identity = request.identity.unwrap();
    assert_eq!(identity.username, "john");
    assert_eq!(identity.groups, vec!["dev".to_string(), "admins".to_string()]);
}

#[test]
fn build_request_rejects_bad_source() {
    let command = parse_check(&["--url", "https://app.example.com/", "--ip", "gateway"]);
    let error = build_request(&command).unwrap_err();
    assert!(error.to_string().contains("invalid source ip"));
}
