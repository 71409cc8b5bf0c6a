//! Configuration types for refguard
//!
//! A configuration file describes one project's protection policy: its
//! repository state, resolved feature flags, enabled extensions, and the
//! protected branches and tags themselves.

use crate::access_control::{
    AccessEvaluator, AccessGrant, CodeOwnerApproval, FeatureGates, ProjectSnapshot, ProjectState,
    ProtectedAction, ProtectedRefSpec, RefKind, RestrictedUnprotect, RoleTier,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Feature flags resolved by the host
    pub features: FeatureGates,

    /// Repository state
    pub project: ProjectConfig,

    /// Optional policy extensions
    pub extensions: ExtensionsConfig,

    /// Protected branches and tags
    pub protected_refs: Vec<ProtectedRefConfig>,
}

impl AppConfig {
    /// Build the evaluation snapshot described by this configuration
    pub fn snapshot(&self) -> ProjectSnapshot {
        let specs = self
            .protected_refs
            .iter()
            .map(ProtectedRefConfig::to_spec)
            .collect();

        ProjectSnapshot::new(self.project.state(), specs).with_features(self.features)
    }

    /// Build an evaluator with the configured extensions
    pub fn evaluator(&self) -> AccessEvaluator {
        let mut evaluator = AccessEvaluator::new();
        if self.extensions.code_owner_approval {
            evaluator = evaluator.with_extension(Arc::new(CodeOwnerApproval));
        }
        if self.extensions.restricted_unprotect {
            evaluator = evaluator.with_extension(Arc::new(RestrictedUnprotect {
                min_tier: self.extensions.unprotect_min_role,
            }));
        }
        evaluator
    }
}

/// Repository state of the project
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Repository has no commits yet
    pub empty_repository: bool,

    /// Default branch protection is enabled for the project
    pub default_branch_protected: bool,

    /// Name of the default branch
    pub default_branch: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let state = ProjectState::default();
        Self {
            empty_repository: state.empty_repository,
            default_branch_protected: state.default_branch_protected,
            default_branch: state.default_branch,
        }
    }
}

impl ProjectConfig {
    pub fn state(&self) -> ProjectState {
        ProjectState {
            empty_repository: self.empty_repository,
            default_branch_protected: self.default_branch_protected,
            default_branch: self.default_branch.clone(),
        }
    }
}

/// Policy extension toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Honour `code_owner_approval_required` on protected branches
    pub code_owner_approval: bool,

    /// Require `unprotect_min_role` to unprotect refs without unprotect rules
    pub restricted_unprotect: bool,

    pub unprotect_min_role: RoleTier,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            code_owner_approval: false,
            restricted_unprotect: false,
            unprotect_min_role: RoleTier::Maintainer,
        }
    }
}

/// One protected branch or tag
///
/// ```toml
/// [[protected_refs]]
/// name = "release/*"
/// push = [{ role = "maintainer" }, { user = 42 }]
/// merge = [{ role = "developer" }]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProtectedRefConfig {
    /// Ref name or wildcard pattern
    pub name: String,

    pub kind: RefKind,

    pub created_at: Option<DateTime<Utc>>,

    pub code_owner_approval_required: bool,

    pub push: Vec<AccessGrant>,

    pub merge: Vec<AccessGrant>,

    /// Empty means anyone may unprotect
    pub unprotect: Vec<AccessGrant>,
}

impl ProtectedRefConfig {
    pub fn to_spec(&self) -> ProtectedRefSpec {
        let mut spec = ProtectedRefSpec::new(self.name.clone(), self.kind);
        spec.created_at = self.created_at;
        spec.code_owner_approval_required = self.code_owner_approval_required;

        let grants = [
            (ProtectedAction::Push, &self.push),
            (ProtectedAction::Merge, &self.merge),
            (ProtectedAction::Unprotect, &self.unprotect),
        ];
        for (action, list) in grants {
            for grant in list {
                spec = spec.allow(action, *grant);
            }
        }
        spec
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
