//! Access control module
//!
//! Decides who may push to, merge into, or unprotect protected branches and
//! tags.
//!
//! ## Model
//!
//! A project owns any number of protected ref specs. Each spec has a name
//! (a literal ref name or a `*` wildcard) and, per action, a set of access
//! rules. A rule grants by role threshold, user, group, or deploy key.
//!
//! ```text
//! AccessEvaluator → extensions → bootstrap rule → ProtectedRefRegistry
//!                                                     ↓ RefPattern
//!                                                 AccessLevelSet
//! ```
//!
//! When several specs match a ref, access is granted if any of them grants
//! it. An empty unprotect rule set lets anyone unprotect; an empty push or
//! merge rule set lets nobody write.
//!
//! ## Example
//!
//! ```
//! use refguard::access_control::{
//!     AccessEvaluator, AccessGrant, Actor, ProjectSnapshot, ProjectState, ProtectedAction,
//!     ProtectedRefSpec, RefKind, RoleTier,
//! };
//!
//! let specs = vec![
//!     ProtectedRefSpec::branch("release/*")
//!         .allow(ProtectedAction::Push, AccessGrant::Role(RoleTier::Maintainer)),
//! ];
//! let project = ProjectSnapshot::new(ProjectState::default(), specs);
//! let evaluator = AccessEvaluator::new();
//!
//! let developer = Actor::new(1, RoleTier::Developer);
//! assert!(!evaluator.can_perform(
//!     &developer,
//!     ProtectedAction::Push,
//!     "release/1.0",
//!     RefKind::Branch,
//!     &project,
//! ));
//! ```

pub mod access_levels;
pub mod evaluator;
pub mod extensions;
pub mod patterns;
pub mod registry;
pub mod types;

pub use access_levels::AccessLevelSet;
pub use evaluator::{AccessDecision, AccessEvaluator, AccessPolicyExtension, AccessRequest};
pub use extensions::{CodeOwnerApproval, RestrictedUnprotect};
pub use patterns::RefPattern;
pub use registry::ProtectedRefRegistry;
pub use types::{
    AccessGrant, AccessRule, Actor, DeployKeyId, FeatureGates, GroupId, ProjectSnapshot,
    ProjectState, ProtectedAction, ProtectedRefSpec, RefKind, RoleTier, UserId,
};
