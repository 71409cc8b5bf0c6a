//! Access control types
//!
//! Core types used by the protected ref evaluation engine. Everything here is
//! an immutable snapshot supplied by the host for a single evaluation.

use crate::access_control::patterns::RefPattern;
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub type UserId = u64;
pub type GroupId = u64;
pub type DeployKeyId = u64;

/// Ordered permission level of an actor within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Not a member. As a rule threshold this means "no one".
    NoAccess,
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
}

impl RoleTier {
    /// Numeric access level as stored by the hosting platform
    pub const fn level(&self) -> u8 {
        match self {
            RoleTier::NoAccess => 0,
            RoleTier::Guest => 10,
            RoleTier::Reporter => 20,
            RoleTier::Developer => 30,
            RoleTier::Maintainer => 40,
            RoleTier::Owner => 50,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RoleTier::NoAccess => "no_access",
            RoleTier::Guest => "guest",
            RoleTier::Reporter => "reporter",
            RoleTier::Developer => "developer",
            RoleTier::Maintainer => "maintainer",
            RoleTier::Owner => "owner",
        }
    }

    pub fn all() -> &'static [RoleTier] {
        &[
            RoleTier::NoAccess,
            RoleTier::Guest,
            RoleTier::Reporter,
            RoleTier::Developer,
            RoleTier::Maintainer,
            RoleTier::Owner,
        ]
    }
}

impl fmt::Display for RoleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoleTier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleTier::all()
            .iter()
            .find(|tier| tier.as_str() == s)
            .copied()
            .ok_or_else(|| ParseError::UnknownRoleTier(s.to_string()))
    }
}

/// Kind of ref a protection applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    #[default]
    Branch,
    Tag,
}

impl RefKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RefKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "branch" => Ok(RefKind::Branch),
            "tag" => Ok(RefKind::Tag),
            _ => Err(ParseError::UnknownRefKind(s.to_string())),
        }
    }
}

/// Action guarded by a protected ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectedAction {
    Push,
    Merge,
    Unprotect,
}

impl ProtectedAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtectedAction::Push => "push",
            ProtectedAction::Merge => "merge",
            ProtectedAction::Unprotect => "unprotect",
        }
    }

    /// Push and merge both write to the ref
    pub const fn writes_ref(&self) -> bool {
        matches!(self, ProtectedAction::Push | ProtectedAction::Merge)
    }
}

impl fmt::Display for ProtectedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtectedAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(ProtectedAction::Push),
            "merge" => Ok(ProtectedAction::Merge),
            "unprotect" => Ok(ProtectedAction::Unprotect),
            _ => Err(ParseError::UnknownAction(s.to_string())),
        }
    }
}

/// Who an access rule grants to
///
/// In TOML this is written as a single-key table, e.g. `{ role = "maintainer" }`
/// or `{ user = 42 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGrant {
    /// Any actor at or above the tier
    Role(RoleTier),
    /// A single user
    User(UserId),
    /// Members of a group
    Group(GroupId),
    /// A deploy key, only honoured when the deploy key gate is on
    DeployKey(DeployKeyId),
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessGrant::Role(tier) => write!(f, "role:{}", tier),
            AccessGrant::User(id) => write!(f, "user:{}", id),
            AccessGrant::Group(id) => write!(f, "group:{}", id),
            AccessGrant::DeployKey(id) => write!(f, "deploy_key:{}", id),
        }
    }
}

/// A single access rule attached to a protected ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRule {
    pub action: ProtectedAction,
    pub grant: AccessGrant,
}

impl AccessRule {
    pub const fn new(action: ProtectedAction, grant: AccessGrant) -> Self {
        Self { action, grant }
    }
}

/// The identity an access decision is made for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    /// Maximum role the actor holds in the project
    pub role_tier: RoleTier,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub admin: bool,
    /// Set when the actor is authenticating with a deploy key
    #[serde(default)]
    pub deploy_key: Option<DeployKeyId>,
}

impl Actor {
    pub fn new(id: UserId, role_tier: RoleTier) -> Self {
        Self {
            id,
            role_tier,
            groups: BTreeSet::new(),
            admin: false,
            deploy_key: None,
        }
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn with_deploy_key(mut self, key: DeployKeyId) -> Self {
        self.deploy_key = Some(key);
        self
    }

    pub fn is_member_of(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }
}

/// A protected branch or tag specification
#[derive(Debug, Clone)]
pub struct ProtectedRefSpec {
    pub pattern: RefPattern,
    pub kind: RefKind,
    pub created_at: Option<DateTime<Utc>>,
    pub code_owner_approval_required: bool,
    pub rules: Vec<AccessRule>,
}

impl ProtectedRefSpec {
    pub fn new(name: impl Into<String>, kind: RefKind) -> Self {
        Self {
            pattern: RefPattern::new(name),
            kind,
            created_at: None,
            code_owner_approval_required: false,
            rules: Vec::new(),
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Self::new(name, RefKind::Branch)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(name, RefKind::Tag)
    }

    /// Add a rule for an action
    pub fn allow(mut self, action: ProtectedAction, grant: AccessGrant) -> Self {
        self.rules.push(AccessRule::new(action, grant));
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn requiring_code_owner_approval(mut self) -> Self {
        self.code_owner_approval_required = true;
        self
    }

    pub fn name(&self) -> &str {
        self.pattern.as_str()
    }

    /// Rules configured for one action, in declared order
    pub fn rules_for(&self, action: ProtectedAction) -> impl Iterator<Item = &AccessRule> {
        self.rules.iter().filter(move |rule| rule.action == action)
    }

    pub fn matches(&self, ref_name: &str) -> bool {
        self.pattern.matches(ref_name)
    }
}

/// Repository facts relevant to protection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub empty_repository: bool,
    pub default_branch_protected: bool,
    pub default_branch: String,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            empty_repository: false,
            default_branch_protected: true,
            default_branch: "main".to_string(),
        }
    }
}

impl ProjectState {
    /// An empty repository whose default branch is protected before any spec exists
    pub fn bootstrap_protected(&self) -> bool {
        self.empty_repository && self.default_branch_protected
    }
}

/// Feature flags resolved by the host before evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureGates {
    /// Honour `deploy_key` grants
    pub deploy_key_grants: bool,
}

/// Everything the evaluator needs to know about one project
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    pub state: ProjectState,
    pub specs: Vec<ProtectedRefSpec>,
    pub features: FeatureGates,
}

impl ProjectSnapshot {
    pub fn new(state: ProjectState, specs: Vec<ProtectedRefSpec>) -> Self {
        Self {
            state,
            specs,
            features: FeatureGates::default(),
        }
    }

    pub fn with_features(mut self, features: FeatureGates) -> Self {
        self.features = features;
        self
    }
}
