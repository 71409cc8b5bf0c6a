//! Protected ref registry
//!
//! Read-only view over the protected ref specs of one project.

use crate::access_control::access_levels::AccessLevelSet;
use crate::access_control::types::{
    AccessRule, Actor, FeatureGates, ProjectState, ProtectedAction, ProtectedRefSpec, RefKind,
};

/// Queries over a project's protected ref specs
#[derive(Debug, Clone, Copy)]
pub struct ProtectedRefRegistry<'a> {
    specs: &'a [ProtectedRefSpec],
}

impl<'a> ProtectedRefRegistry<'a> {
    pub fn new(specs: &'a [ProtectedRefSpec]) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &'a [ProtectedRefSpec] {
        self.specs
    }

    /// Specs of `kind` whose pattern matches `ref_name`, in declared order
    pub fn matching_specs(&self, ref_name: &str, kind: RefKind) -> Vec<&'a ProtectedRefSpec> {
        self.of_kind(kind)
            .filter(|spec| spec.matches(ref_name))
            .collect()
    }

    /// Whether a ref is protected
    ///
    /// The default branch of an empty repository counts as protected when
    /// default branch protection is on, even before any spec exists.
    pub fn is_protected(&self, ref_name: &str, kind: RefKind, state: &ProjectState) -> bool {
        if kind == RefKind::Branch && state.bootstrap_protected() {
            return true;
        }

        self.of_kind(kind).any(|spec| spec.matches(ref_name))
    }

    /// Whether any of the names is protected, ignoring the empty repository rule
    pub fn any_protected<S: AsRef<str>>(&self, ref_names: &[S], kind: RefKind) -> bool {
        self.of_kind(kind).any(|spec| {
            ref_names
                .iter()
                .any(|ref_name| spec.matches(ref_name.as_ref()))
        })
    }

    /// Rules for `action` across every spec matching the ref
    pub fn access_rules_for_ref(
        &self,
        ref_name: &str,
        kind: RefKind,
        action: ProtectedAction,
    ) -> Vec<&'a AccessRule> {
        self.matching_specs(ref_name, kind)
            .into_iter()
            .flat_map(|spec| spec.rules_for(action))
            .collect()
    }

    /// Case-insensitive substring search on spec names
    pub fn by_name(&self, query: &str) -> Vec<&'a ProtectedRefSpec> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.specs
            .iter()
            .filter(|spec| spec.name().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn requiring_code_owner_approval(&self) -> Vec<&'a ProtectedRefSpec> {
        self.specs
            .iter()
            .filter(|spec| spec.code_owner_approval_required)
            .collect()
    }

    /// Whether an actor may remove this particular protection
    pub fn can_unprotect(spec: &ProtectedRefSpec, actor: &Actor, features: FeatureGates) -> bool {
        AccessLevelSet::new(spec.rules_for(ProtectedAction::Unprotect))
            .with_features(features)
            .satisfied_by(actor)
    }

    fn of_kind(&self, kind: RefKind) -> impl Iterator<Item = &'a ProtectedRefSpec> {
        self.specs.iter().filter(move |spec| spec.kind == kind)
    }
}
