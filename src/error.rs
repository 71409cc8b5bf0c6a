//! Error types for refguard
//!
//! Business-data problems (bad patterns, dangling rule references) never
//! surface here; they degrade to "no match" or "deny" inside the engine.
//! These errors cover caller contract violations, configuration, and
//! propagated denials.

use crate::access_control::ProtectedAction;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Parse(#[from] ParseError),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unknown enum values supplied by a caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown role tier '{0}' (expected no_access, guest, reporter, developer, maintainer or owner)")]
    UnknownRoleTier(String),

    #[error("unknown action '{0}' (expected push, merge or unprotect)")]
    UnknownAction(String),

    #[error("unknown ref kind '{0}' (expected branch or tag)")]
    UnknownRefKind(String),

    #[error("unknown output format '{0}' (expected text or json)")]
    UnknownOutputFormat(String),
}

/// A denied protected ref action
#[derive(Error, Debug, Clone)]
#[error("cannot {action} '{ref_name}': {reason}")]
pub struct AccessDeniedError {
    pub action: ProtectedAction,
    pub ref_name: String,
    pub reason: String,
    /// Names of the protected refs that governed the decision
    pub governing: Vec<String>,
}

impl AccessDeniedError {
    pub fn new(
        action: ProtectedAction,
        ref_name: impl Into<String>,
        reason: impl Into<String>,
        governing: Vec<String>,
    ) -> Self {
        Self {
            action,
            ref_name: ref_name.into(),
            reason: reason.into(),
            governing,
        }
    }

    /// No protection matched, so nothing granted the action
    pub fn ungoverned(action: ProtectedAction, ref_name: impl Into<String>) -> Self {
        Self::new(action, ref_name, "no protected ref grants this action", Vec::new())
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
