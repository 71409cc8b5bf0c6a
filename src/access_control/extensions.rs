//! Bundled policy extensions
//!
//! Both are opt-in; the evaluator runs with no extensions by default.

use crate::access_control::access_levels::AccessLevelSet;
use crate::access_control::evaluator::{AccessDecision, AccessPolicyExtension, AccessRequest};
use crate::access_control::registry::ProtectedRefRegistry;
use crate::access_control::types::{ProjectSnapshot, ProtectedAction, RefKind, RoleTier};
use tracing::trace;

/// Branches matching a flagged spec need code owner approval to merge
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeOwnerApproval;

impl AccessPolicyExtension for CodeOwnerApproval {
    fn name(&self) -> &'static str {
        "code_owner_approval"
    }

    fn requires_code_owner_approval(&self, branch: &str, project: &ProjectSnapshot) -> bool {
        ProtectedRefRegistry::new(&project.specs)
            .matching_specs(branch, RefKind::Branch)
            .iter()
            .any(|spec| spec.code_owner_approval_required)
    }
}

/// Unprotecting a spec without unprotect rules requires at least `min_tier`
///
/// Without this extension an empty unprotect rule set lets anyone remove the
/// protection.
#[derive(Debug, Clone, Copy)]
pub struct RestrictedUnprotect {
    pub min_tier: RoleTier,
}

impl Default for RestrictedUnprotect {
    fn default() -> Self {
        Self {
            min_tier: RoleTier::Maintainer,
        }
    }
}

impl AccessPolicyExtension for RestrictedUnprotect {
    fn name(&self) -> &'static str {
        "restricted_unprotect"
    }

    fn pre_check(
        &self,
        request: &AccessRequest<'_>,
        project: &ProjectSnapshot,
    ) -> Option<AccessDecision> {
        if request.action != ProtectedAction::Unprotect {
            return None;
        }

        let actor = request.actor;
        if actor.admin || actor.role_tier >= self.min_tier {
            return None;
        }

        let matching = ProtectedRefRegistry::new(&project.specs)
            .matching_specs(request.ref_name, request.kind);

        let open: Vec<String> = matching
            .iter()
            .filter(|spec| spec.rules_for(ProtectedAction::Unprotect).next().is_none())
            .map(|spec| spec.name().to_string())
            .collect();

        if open.is_empty() {
            return None;
        }

        // An explicit grant on any matching spec still wins
        let granted = matching.iter().any(|spec| {
            let set = AccessLevelSet::new(spec.rules_for(ProtectedAction::Unprotect))
                .with_features(project.features);
            !set.is_empty() && set.satisfied_by(actor)
        });
        if granted {
            return None;
        }

        trace!(actor = actor.id, min_tier = %self.min_tier, "Restricting unprotect");
        Some(AccessDecision::denied(
            format!(
                "unprotecting '{}' requires at least the {} role",
                request.ref_name, self.min_tier
            ),
            open,
        ))
    }
}
