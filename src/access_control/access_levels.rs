//! Access level sets
//!
//! The rules attached to one action of a protected ref. A set is satisfied
//! when the actor meets at least one rule.

use crate::access_control::types::{AccessGrant, AccessRule, Actor, FeatureGates, RoleTier};
use tracing::trace;

/// The rules configured for one action
#[derive(Debug, Clone)]
pub struct AccessLevelSet<'a> {
    rules: Vec<&'a AccessRule>,
    features: FeatureGates,
}

impl<'a> AccessLevelSet<'a> {
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = &'a AccessRule>,
    {
        Self {
            rules: rules.into_iter().collect(),
            features: FeatureGates::default(),
        }
    }

    pub fn with_features(mut self, features: FeatureGates) -> Self {
        self.features = features;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the actor meets at least one rule
    ///
    /// An empty set is satisfied by everyone. Callers that want an empty set
    /// to mean "nobody" have to check [`is_empty`](Self::is_empty) first.
    pub fn satisfied_by(&self, actor: &Actor) -> bool {
        self.is_empty() || self.first_match(actor).is_some()
    }

    /// The first rule the actor meets, if any
    pub fn first_match(&self, actor: &Actor) -> Option<&'a AccessRule> {
        self.rules
            .iter()
            .copied()
            .find(|rule| self.grants(rule.grant, actor))
    }

    fn grants(&self, grant: AccessGrant, actor: &Actor) -> bool {
        let granted = match grant {
            AccessGrant::Role(_) if actor.admin => true,
            AccessGrant::Role(RoleTier::NoAccess) => false,
            AccessGrant::Role(threshold) => actor.role_tier >= threshold,
            AccessGrant::User(id) => actor.id == id,
            AccessGrant::Group(id) => actor.is_member_of(id),
            AccessGrant::DeployKey(id) => {
                self.features.deploy_key_grants && actor.deploy_key == Some(id)
            }
        };
        trace!(grant = %grant, actor = actor.id, granted, "Evaluated access rule");
        granted
    }
}
