// crates/gatehouse-cli/src/main.rs
// ============================================================================
// Module: Gatehouse CLI Entry Point
// Description: Command dispatcher for offline access-control tooling.
// Purpose: Validate configs, list compiled rules and evaluate single requests.
// Dependencies: clap, gatehouse-cli, gatehouse-config, gatehouse-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The `gatehouse` binary loads a configuration file, compiles its
//! access-control table and either reports on it or evaluates one request
//! against it. Compile warnings go to stderr; results go to stdout.
//!
//! Security posture: inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use gatehouse_cli::check::CheckInputError;
use gatehouse_cli::check::CheckReport;
use gatehouse_cli::check::SessionInput;
use gatehouse_cli::check::current_timestamp;
use gatehouse_cli::check::parse_source;
use gatehouse_cli::check::parse_target;
use gatehouse_cli::check::parse_timestamp;
use gatehouse_cli::rules::render_rule_set;
use gatehouse_config::GatehouseConfig;
use gatehouse_config::config_toml_example;
use gatehouse_core::AuthenticationLevel;
use gatehouse_core::CompileIssue;
use gatehouse_core::Identity;
use gatehouse_core::RequestContext;
use gatehouse_core::Timestamp;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "gatehouse", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Evaluate one request against the configured rules.
    Check(Box<CheckCommand>),
    /// List the compiled rule table in evaluation order.
    Rules(RulesCommand),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate and compile a Gatehouse configuration file.
    Validate(ConfigValidateCommand),
    /// Print the bundled example configuration.
    Example,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to gatehouse.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the rule listing.
#[derive(Args, Debug)]
struct RulesCommand {
    /// Optional config file path (defaults to gatehouse.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for a single offline evaluation.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Target URL; the host is the domain and the path includes the query.
    #[arg(long, value_name = "URL")]
    url: String,
    /// HTTP method of the request.
    #[arg(long, value_name = "METHOD", default_value = "GET")]
    method: String,
    /// Client source address.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1")]
    ip: String,
    /// Authenticated username.
    #[arg(long, value_name = "NAME")]
    user: Option<String>,
    /// Group membership of the user (repeatable).
    #[arg(long = "group", value_name = "GROUP", requires = "user")]
    groups: Vec<String>,
    /// Authentication level attained by the session.
    #[arg(long, value_enum, default_value = "none")]
    session_level: SessionLevelArg,
    /// Session expiry (RFC 3339); defaults to now plus the configured lifetime.
    #[arg(long, value_name = "RFC3339")]
    session_expires: Option<String>,
    /// Mark the session as remembered.
    #[arg(long, action = ArgAction::SetTrue)]
    remembered: bool,
    /// Last session activity (RFC 3339); defaults to now.
    #[arg(long, value_name = "RFC3339")]
    last_activity: Option<String>,
    /// Evaluation time (RFC 3339); defaults to the current time.
    #[arg(long, value_name = "RFC3339")]
    now: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Optional config file path (defaults to gatehouse.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Session levels accepted on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum SessionLevelArg {
    /// No session.
    None,
    /// First factor verified.
    #[value(name = "one_factor")]
    OneFactor,
    /// Second factor verified.
    #[value(name = "two_factor")]
    TwoFactor,
}

impl From<SessionLevelArg> for AuthenticationLevel {
    fn from(value: SessionLevelArg) -> Self {
        match value {
            SessionLevelArg::None => Self::Unauthenticated,
            SessionLevelArg::OneFactor => Self::OneFactor,
            SessionLevelArg::TwoFactor => Self::TwoFactor,
        }
    }
}

/// Output formats for `check`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty-printed JSON output.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<CheckInputError> for CliError {
    fn from(error: CheckInputError) -> Self {
        Self::new(error.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("gatehouse {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Check(command) => command_check(&command),
        Commands::Rules(command) => command_rules(&command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let compilation =
        config.compile().map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    emit_warnings(&compilation.warnings)?;
    write_stdout_line(&format!(
        "config ok: {} rules, default policy {}",
        compilation.rule_set.len(),
        compilation.rule_set.default_policy()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the bundled example configuration.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_line(config_toml_example().trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Rule Commands
// ============================================================================

/// Lists compiled rules.
fn command_rules(command: &RulesCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let compilation =
        config.compile().map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    emit_warnings(&compilation.warnings)?;
    for line in render_rule_set(&compilation.rule_set) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Evaluates one request and prints the report.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let (gate, warnings) =
        config.build_gate().map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    emit_warnings(&warnings)?;

    let now = match command.now.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => current_timestamp()?,
    };
    let request = build_request(command)?;
    let session = SessionInput {
        level: command.session_level.into(),
        expires_at: parse_optional_timestamp(command.session_expires.as_deref())?,
        remembered: command.remembered,
        last_activity: parse_optional_timestamp(command.last_activity.as_deref())?,
    }
    .to_state(now, config.session.lifetime_ms(command.remembered));

    let outcome = gate.check(&request, session.as_ref(), now);
    let report = CheckReport::new(&request, &outcome, now);
    let rendered = match command.format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| CliError::new(format!("failed to render report: {err}")))?,
    };
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the engine request from `check` arguments.
fn build_request(command: &CheckCommand) -> CliResult<RequestContext> {
    let target = parse_target(&command.url)?;
    let source = parse_source(&command.ip)?;
    let method = command.method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err(CliError::new("--method must be non-empty".to_string()));
    }
    let request = RequestContext::new(target.domain, target.path, method, source);
    Ok(match &command.user {
        Some(user) => request.with_identity(Identity::new(user.clone(), command.groups.clone())),
        None => request,
    })
}

/// Parses an optional RFC 3339 argument.
fn parse_optional_timestamp(raw: Option<&str>) -> CliResult<Option<Timestamp>> {
    raw.map(parse_timestamp).transpose().map_err(CliError::from)
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads configuration, mapping failures to CLI errors.
fn load_config(path: Option<&Path>) -> CliResult<GatehouseConfig> {
    GatehouseConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes compile warnings to stderr.
fn emit_warnings(warnings: &[CompileIssue]) -> CliResult<()> {
    for warning in warnings {
        write_stderr_line(&format!("warning: {warning}"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
