//! Access evaluator
//!
//! Decides whether an actor may push to, merge into, or unprotect a ref.
//! Evaluation order (first decisive step wins):
//! 1. Policy extensions, in registration order
//! 2. Empty repository bootstrap: admins and actors above developer may
//!    push/merge the default branch before any spec exists
//! 3. Matching specs, OR'd: the least restrictive matching spec governs
//! 4. Deny

use crate::access_control::access_levels::AccessLevelSet;
use crate::access_control::registry::ProtectedRefRegistry;
use crate::access_control::types::{
    Actor, ProjectSnapshot, ProtectedAction, ProtectedRefSpec, RefKind, RoleTier,
};
use crate::error::AccessDeniedError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A single access question
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub actor: &'a Actor,
    pub action: ProtectedAction,
    pub ref_name: &'a str,
    pub kind: RefKind,
}

impl<'a> AccessRequest<'a> {
    pub fn new(
        actor: &'a Actor,
        action: ProtectedAction,
        ref_name: &'a str,
        kind: RefKind,
    ) -> Self {
        Self {
            actor,
            action,
            ref_name,
            kind,
        }
    }

    pub fn branch(actor: &'a Actor, action: ProtectedAction, ref_name: &'a str) -> Self {
        Self::new(actor, action, ref_name, RefKind::Branch)
    }

    pub fn tag(actor: &'a Actor, action: ProtectedAction, ref_name: &'a str) -> Self {
        Self::new(actor, action, ref_name, RefKind::Tag)
    }
}

/// Result of an access evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Access is allowed
    Allowed { reason: String },
    /// Access is denied; `governing` names the specs that applied
    Denied {
        reason: String,
        governing: Vec<String>,
    },
    /// No protection applies to the ref; the host's outer policy decides
    Ungoverned,
}

impl AccessDecision {
    pub fn allowed(reason: impl Into<String>) -> Self {
        AccessDecision::Allowed {
            reason: reason.into(),
        }
    }

    pub fn denied(reason: impl Into<String>, governing: Vec<String>) -> Self {
        AccessDecision::Denied {
            reason: reason.into(),
            governing,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied { .. })
    }

    pub fn is_ungoverned(&self) -> bool {
        matches!(self, AccessDecision::Ungoverned)
    }

    pub fn governing(&self) -> &[String] {
        match self {
            AccessDecision::Denied { governing, .. } => governing,
            _ => &[],
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::Allowed { reason } => write!(f, "allowed: {}", reason),
            AccessDecision::Denied { reason, .. } => write!(f, "denied: {}", reason),
            AccessDecision::Ungoverned => write!(f, "ungoverned: no protected ref matches"),
        }
    }
}

/// Hook for edition-specific policy on top of the default decision sequence
///
/// All methods have no-op defaults.
pub trait AccessPolicyExtension: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs before the default sequence; `Some` short-circuits it
    fn pre_check(
        &self,
        _request: &AccessRequest<'_>,
        _project: &ProjectSnapshot,
    ) -> Option<AccessDecision> {
        None
    }

    fn requires_code_owner_approval(&self, _branch: &str, _project: &ProjectSnapshot) -> bool {
        false
    }
}

/// Protected ref access evaluator
#[derive(Clone, Default)]
pub struct AccessEvaluator {
    extensions: Vec<Arc<dyn AccessPolicyExtension>>,
}

impl fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.extensions.iter().map(|e| e.name()).collect();
        f.debug_struct("AccessEvaluator")
            .field("extensions", &names)
            .finish()
    }
}

impl AccessEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: Arc<dyn AccessPolicyExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Check whether the actor may perform the action
    ///
    /// Only an explicit grant counts; ungoverned refs return `false` here and
    /// are distinguishable through [`evaluate`](Self::evaluate).
    pub fn can_perform(
        &self,
        actor: &Actor,
        action: ProtectedAction,
        ref_name: &str,
        kind: RefKind,
        project: &ProjectSnapshot,
    ) -> bool {
        self.evaluate(&AccessRequest::new(actor, action, ref_name, kind), project)
            .is_allowed()
    }

    /// Evaluate a request, returning the full decision
    pub fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        project: &ProjectSnapshot,
    ) -> AccessDecision {
        debug!(
            actor = request.actor.id,
            action = %request.action,
            ref_name = request.ref_name,
            kind = %request.kind,
            "Checking protected ref access"
        );

        for extension in &self.extensions {
            if let Some(decision) = extension.pre_check(request, project) {
                trace!(extension = extension.name(), %decision, "Extension decided");
                return decision;
            }
        }

        if let Some(decision) = Self::check_bootstrap(request, project) {
            return decision;
        }

        let registry = ProtectedRefRegistry::new(&project.specs);
        let matching = registry.matching_specs(request.ref_name, request.kind);
        if matching.is_empty() {
            trace!("No protected ref matches");
            return AccessDecision::Ungoverned;
        }

        let granting = matching
            .iter()
            .find(|spec| Self::spec_grants(spec, request, project));
        if let Some(spec) = granting {
            trace!(spec = spec.name(), "Matched granting protected ref");
            return AccessDecision::allowed(format!(
                "{} allowed by protected {} '{}'",
                request.action,
                request.kind,
                spec.name()
            ));
        }

        let governing: Vec<String> = matching.iter().map(|s| s.name().to_string()).collect();
        AccessDecision::denied(
            format!(
                "not allowed to {} protected {} '{}'",
                request.action, request.kind, request.ref_name
            ),
            governing,
        )
    }

    /// Evaluate and turn anything but an explicit grant into an error
    pub fn require(
        &self,
        request: &AccessRequest<'_>,
        project: &ProjectSnapshot,
    ) -> Result<(), AccessDeniedError> {
        match self.evaluate(request, project) {
            AccessDecision::Allowed { .. } => Ok(()),
            AccessDecision::Denied { reason, governing } => Err(AccessDeniedError::new(
                request.action,
                request.ref_name,
                reason,
                governing,
            )),
            AccessDecision::Ungoverned => Err(AccessDeniedError::ungoverned(
                request.action,
                request.ref_name,
            )),
        }
    }

    /// Whether merging into the branch needs code owner approval
    pub fn requires_code_owner_approval(&self, branch: &str, project: &ProjectSnapshot) -> bool {
        self.extensions
            .iter()
            .any(|e| e.requires_code_owner_approval(branch, project))
    }

    fn check_bootstrap(
        request: &AccessRequest<'_>,
        project: &ProjectSnapshot,
    ) -> Option<AccessDecision> {
        if request.kind != RefKind::Branch
            || !request.action.writes_ref()
            || !project.state.bootstrap_protected()
        {
            return None;
        }

        let actor = request.actor;
        if actor.admin || actor.role_tier > RoleTier::Developer {
            trace!(actor = actor.id, "Empty repository bootstrap grants access");
            return Some(AccessDecision::allowed(format!(
                "{} may create the default branch of an empty repository",
                if actor.admin { "admin" } else { actor.role_tier.as_str() }
            )));
        }

        None
    }

    fn spec_grants(
        spec: &ProtectedRefSpec,
        request: &AccessRequest<'_>,
        project: &ProjectSnapshot,
    ) -> bool {
        let set = AccessLevelSet::new(spec.rules_for(request.action))
            .with_features(project.features);

        match request.action {
            ProtectedAction::Unprotect => set.satisfied_by(request.actor),
            // An empty push/merge set means nobody may write
            ProtectedAction::Push | ProtectedAction::Merge => {
                !set.is_empty() && set.satisfied_by(request.actor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::types::{AccessGrant, ProjectState};

    fn project(specs: Vec<ProtectedRefSpec>) -> ProjectSnapshot {
        ProjectSnapshot::new(ProjectState::default(), specs)
    }

    fn empty_project() -> ProjectSnapshot {
        ProjectSnapshot::new(
            ProjectState {
                empty_repository: true,
                default_branch_protected: true,
                default_branch: "main".into(),
            },
            Vec::new(),
        )
    }

    struct DenyEverything;

    impl AccessPolicyExtension for DenyEverything {
        fn name(&self) -> &'static str {
            "deny_everything"
        }

        fn pre_check(
            &self,
            _request: &AccessRequest<'_>,
            _project: &ProjectSnapshot,
        ) -> Option<AccessDecision> {
            Some(AccessDecision::denied("frozen", Vec::new()))
        }
    }

    #[test]
    fn test_ungoverned_ref() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Developer);
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "feature");

        let decision = evaluator.evaluate(&request, &project(Vec::new()));
        assert!(decision.is_ungoverned());
        assert!(!evaluator.can_perform(
            &actor,
            ProtectedAction::Push,
            "feature",
            RefKind::Branch,
            &project(Vec::new())
        ));
    }

    #[test]
    fn test_bootstrap_grants_maintainer() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Maintainer);
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "main");
        assert!(evaluator.evaluate(&request, &empty_project()).is_allowed());
    }

    #[test]
    fn test_bootstrap_does_not_cover_unprotect_or_tags() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Owner);

        let unprotect = AccessRequest::branch(&actor, ProtectedAction::Unprotect, "main");
        assert!(evaluator.evaluate(&unprotect, &empty_project()).is_ungoverned());

        let tag = AccessRequest::tag(&actor, ProtectedAction::Push, "v1.0");
        assert!(evaluator.evaluate(&tag, &empty_project()).is_ungoverned());
    }

    #[test]
    fn test_empty_push_rules_deny() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Owner);
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "main");

        let project = project(vec![ProtectedRefSpec::branch("main")]);
        let decision = evaluator.evaluate(&request, &project);
        assert!(decision.is_denied());
        assert_eq!(decision.governing(), ["main".to_string()]);
    }

    #[test]
    fn test_denied_lists_governing_specs() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Developer);
        let specs = vec![
            ProtectedRefSpec::branch("release/*")
                .allow(ProtectedAction::Push, AccessGrant::Role(RoleTier::Maintainer)),
            ProtectedRefSpec::branch("release/1.*")
                .allow(ProtectedAction::Push, AccessGrant::Role(RoleTier::Owner)),
        ];
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "release/1.2");

        let decision = evaluator.evaluate(&request, &project(specs));
        assert_eq!(
            decision.governing(),
            ["release/*".to_string(), "release/1.*".to_string()]
        );
    }

    #[test]
    fn test_extension_short_circuits() {
        let evaluator = AccessEvaluator::new().with_extension(Arc::new(DenyEverything));
        let actor = Actor::new(1, RoleTier::Owner).admin();
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "main");

        assert!(evaluator.evaluate(&request, &empty_project()).is_denied());
        assert_eq!(evaluator.extension_names(), vec!["deny_everything"]);
    }

    #[test]
    fn test_require_maps_to_error() {
        let evaluator = AccessEvaluator::new();
        let actor = Actor::new(1, RoleTier::Reporter);
        let specs = vec![ProtectedRefSpec::branch("main")
            .allow(ProtectedAction::Merge, AccessGrant::Role(RoleTier::Developer))];
        let request = AccessRequest::branch(&actor, ProtectedAction::Merge, "main");

        let err = evaluator.require(&request, &project(specs)).unwrap_err();
        assert_eq!(err.governing, vec!["main".to_string()]);
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn test_decision_serializes_with_tag() {
        let decision = AccessDecision::denied("nope", vec!["main".into()]);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "denied");
        assert_eq!(json["governing"][0], "main");
    }
}
