// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Configure Error Types with Error Codes
//!
//! Error code ranges:
//! - CONF-000-009: Settings errors
//! - CONF-010-019: Schema errors
//! - CONF-020-029: Variable value errors
//! - CONF-030-039: Artifact output errors
//!
//! The expansion engine itself never fails: unresolved references, stray
//! placeholder syntax and reference cycles all have defined results. Every
//! variant here comes from the plumbing around it.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigureError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigureError {
    // ═══════════════════════════════════════════
    // SETTINGS ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[CONF-001] Failed to load settings from '{}': {reason}", .path.display())]
    #[diagnostic(code(configure::settings))]
    Settings { path: PathBuf, reason: String },

    #[error("[CONF-002] Invalid application version '{version}': {reason}")]
    #[diagnostic(code(configure::invalid_version))]
    InvalidVersion { version: String, reason: String },

    #[error("[CONF-003] '{value}' is not a valid Rust identifier for {role}")]
    #[diagnostic(code(configure::invalid_identifier))]
    InvalidIdentifier { value: String, role: &'static str },

    // ═══════════════════════════════════════════
    // SCHEMA ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[CONF-010] Variable '{name}' is declared more than once")]
    #[diagnostic(code(configure::duplicate_variable))]
    DuplicateVariable { name: String },

    #[error("[CONF-011] Variable '{name}' has an invalid field '{field}': {reason}")]
    #[diagnostic(code(configure::invalid_field))]
    InvalidField {
        name: String,
        field: String,
        reason: String,
    },

    // ═══════════════════════════════════════════
    // VARIABLE ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[CONF-020] Settings assign unknown variable '{name}'")]
    #[diagnostic(code(configure::unknown_variable))]
    UnknownVariable { name: String },

    // ═══════════════════════════════════════════
    // OUTPUT ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[CONF-030] Failed to write '{}': {source}", .path.display())]
    #[diagnostic(code(configure::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CONF-031] Cannot deduce build target from '{}'", .path.display())]
    #[diagnostic(code(configure::target_unknown))]
    TargetUnknown { path: PathBuf },
}

impl ConfigureError {
    /// Wrap an io error with the artifact path it happened on
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigureError::Write {
            path: path.into(),
            source,
        }
    }

    /// Stable error code, e.g. `CONF-030`
    pub fn code(&self) -> &'static str {
        match self {
            ConfigureError::Settings { .. } => "CONF-001",
            ConfigureError::InvalidVersion { .. } => "CONF-002",
            ConfigureError::InvalidIdentifier { .. } => "CONF-003",
            ConfigureError::DuplicateVariable { .. } => "CONF-010",
            ConfigureError::InvalidField { .. } => "CONF-011",
            ConfigureError::UnknownVariable { .. } => "CONF-020",
            ConfigureError::Write { .. } => "CONF-030",
            ConfigureError::TargetUnknown { .. } => "CONF-031",
        }
    }
}

impl FixSuggestion for ConfigureError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ConfigureError::Settings { .. } => Some("Check TOML syntax and field names in the settings file"),
            ConfigureError::InvalidVersion { .. } => {
                Some("Use dot-separated non-negative integers, e.g. 1.4.2")
            }
            ConfigureError::InvalidIdentifier { .. } => {
                Some("Use letters, digits and underscores, not starting with a digit")
            }
            ConfigureError::DuplicateVariable { .. } => Some("Give every variable a unique name"),
            ConfigureError::InvalidField { .. } => {
                Some("Use a unique snake_case field name for each variable")
            }
            ConfigureError::UnknownVariable { .. } => {
                Some("Remove the entry from [variables] or declare the variable in the schema")
            }
            ConfigureError::Write { .. } => Some("Check the output path exists and is writable"),
            ConfigureError::TargetUnknown { .. } => Some("Pass --target <NAME> explicitly"),
        }
    }
}
