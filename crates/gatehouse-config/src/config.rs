// crates/gatehouse-config/src/config.rs
// ============================================================================
// Module: Gatehouse Configuration
// Description: Configuration loading and validation for Gatehouse.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: gatehouse-core, serde, serde_yaml, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML (or YAML) file with strict size and path
//! limits. Missing or invalid configuration fails closed.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use gatehouse_core::AccessGate;
use gatehouse_core::AuditSink;
use gatehouse_core::Compilation;
use gatehouse_core::CompileIssue;
use gatehouse_core::FileAuditSink;
use gatehouse_core::NoopAuditSink;
use gatehouse_core::SessionGate;
use gatehouse_core::SessionPolicy;
use gatehouse_core::StderrAuditSink;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::access_control::AccessControlConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "gatehouse.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "GATEHOUSE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default absolute session lifetime (one hour).
const DEFAULT_EXPIRATION_MS: u64 = 60 * 60 * 1000;
/// Default remember-me lifetime (one month).
const DEFAULT_REMEMBER_ME_MS: u64 = 30 * 24 * 60 * 60 * 1000;

// ============================================================================
// SECTION: Format
// ============================================================================

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document.
    Toml,
    /// YAML document.
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from a file extension; anything but `.yml`/`.yaml` is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Gatehouse configuration root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatehouseConfig {
    /// Access-control table.
    #[serde(default)]
    pub access_control: AccessControlConfig,
    /// Session validity settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Audit logging settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl GatehouseConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = config_path(path)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_str_with_format(content, ConfigFormat::from_path(&resolved))
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?
            }
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.access_control.validate()?;
        self.session.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Compiles the access-control table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when compilation fails.
    pub fn compile(&self) -> Result<Compilation, ConfigError> {
        self.access_control.compile()
    }

    /// Builds a ready-to-serve access gate and returns compile warnings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when compilation fails or the audit sink
    /// cannot be opened.
    pub fn build_gate(&self) -> Result<(AccessGate, Vec<CompileIssue>), ConfigError> {
        let compilation = self.compile()?;
        let gate = AccessGate::with_audit(
            compilation.rule_set,
            SessionGate::new(self.session.policy()),
            self.audit.build_sink()?,
        );
        Ok((gate, compilation.warnings))
    }
}

// ============================================================================
// SECTION: Session Config
// ============================================================================

/// `[session]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Absolute session lifetime in milliseconds.
    #[serde(default = "default_expiration_ms")]
    pub expiration_ms: u64,
    /// Inactivity window in milliseconds; unset disables the check.
    #[serde(default)]
    pub inactivity_ms: Option<u64>,
    /// Lifetime of remembered sessions in milliseconds.
    #[serde(default = "default_remember_me_ms")]
    pub remember_me_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_ms: DEFAULT_EXPIRATION_MS,
            inactivity_ms: None,
            remember_me_ms: DEFAULT_REMEMBER_ME_MS,
        }
    }
}

impl SessionConfig {
    /// Validates session limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration_ms == 0 {
            return Err(ConfigError::Invalid("session.expiration_ms must be > 0".to_string()));
        }
        if self.inactivity_ms == Some(0) {
            return Err(ConfigError::Invalid("session.inactivity_ms must be > 0".to_string()));
        }
        if self.remember_me_ms == 0 {
            return Err(ConfigError::Invalid("session.remember_me_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Session gate policy.
    #[must_use]
    pub const fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            inactivity_ms: self.inactivity_ms,
        }
    }

    /// Lifetime applied to a new session.
    #[must_use]
    pub const fn lifetime_ms(&self, remembered: bool) -> u64 {
        if remembered { self.remember_me_ms } else { self.expiration_ms }
    }
}

/// Serde default for [`SessionConfig::expiration_ms`].
const fn default_expiration_ms() -> u64 {
    DEFAULT_EXPIRATION_MS
}

/// Serde default for [`SessionConfig::remember_me_ms`].
const fn default_remember_me_ms() -> u64 {
    DEFAULT_REMEMBER_ME_MS
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// `[audit]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether decisions are audited.
    #[serde(default)]
    pub enabled: bool,
    /// JSON-lines file; stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates the audit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the path is empty or too long.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let trimmed = path.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid("audit.path must be non-empty".to_string()));
            }
            check_path_limits("audit.path", Path::new(trimmed))?;
        }
        Ok(())
    }

    /// Opens the configured sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        if !self.enabled {
            return Ok(Arc::new(NoopAuditSink));
        }
        match &self.path {
            Some(path) => {
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            None => Ok(Arc::new(StderrAuditSink)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or YAML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the config file: explicit path, then `GATEHOUSE_CONFIG`, then
/// `gatehouse.toml` in the working directory.
fn config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => env::var_os(CONFIG_ENV_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from),
    };
    check_path_limits("config path", &path)?;
    Ok(path)
}

/// Rejects paths over the total or per-component length limits.
fn check_path_limits(label: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} exceeds max length")));
    }
    if path.components().any(|part| part.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(ConfigError::Invalid(format!("{label} component too long")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
