//! Post-resolution overrides.
//!
//! Installations sometimes need to tighten or loosen a specific answer, for
//! example "only keymasters may delete forums". Rather than letting every
//! rule be patched from the outside, overrides run as a separate, ordered
//! chain over the resolver's output. The resolver itself stays untouched.

use std::fmt;
use std::sync::Arc;

use keygate_capability::{CapabilityId, CapabilitySet, ObjectKind};

use crate::action::Action;
use crate::resolver::Request;

/// Rewrites a resolved capability set.
pub trait CapabilityOverride: Send + Sync + fmt::Debug {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Check if this override wants to see a request.
    fn applies_to(&self, _request: &Request<'_>) -> bool {
        true
    }

    /// Rewrite the resolved set.
    fn apply(&self, request: &Request<'_>, resolved: CapabilitySet) -> CapabilitySet;
}

/// A shared override.
pub type SharedOverride = Arc<dyn CapabilityOverride>;

/// Replaces the requirement for one action with a fixed primitive.
///
/// Inactive identities keep their `{do_not_allow}`; an override never lifts
/// a universal deny.
#[derive(Debug, Clone)]
pub struct RequireOverride {
    action: Action,
    kind: Option<ObjectKind>,
    capability: CapabilityId,
}

impl RequireOverride {
    /// Require `capability` for `action` on every kind.
    pub fn new(action: Action, capability: CapabilityId) -> Self {
        Self {
            action,
            kind: None,
            capability,
        }
    }

    /// Restrict the override to one kind.
    pub fn for_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl CapabilityOverride for RequireOverride {
    fn name(&self) -> &str {
        "require"
    }

    fn applies_to(&self, request: &Request<'_>) -> bool {
        request.action == self.action && self.kind.is_none_or(|kind| kind == request.kind)
    }

    fn apply(&self, _request: &Request<'_>, resolved: CapabilitySet) -> CapabilitySet {
        if resolved.is_deny() {
            resolved
        } else {
            CapabilitySet::single(self.capability.clone())
        }
    }
}

/// An override backed by a closure.
pub struct FnOverride<F> {
    name: String,
    f: F,
}

impl<F> FnOverride<F>
where
    F: Fn(&Request<'_>, CapabilitySet) -> CapabilitySet + Send + Sync,
{
    /// Create a named closure override.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnOverride<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOverride").field("name", &self.name).finish()
    }
}

impl<F> CapabilityOverride for FnOverride<F>
where
    F: Fn(&Request<'_>, CapabilitySet) -> CapabilitySet + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, request: &Request<'_>, resolved: CapabilitySet) -> CapabilitySet {
        (self.f)(request, resolved)
    }
}

/// Ordered chain of overrides.
///
/// Each override sees the output of the previous one. An empty result is
/// replaced by `{do_not_allow}`.
#[derive(Clone, Default)]
pub struct OverrideChain {
    overrides: Vec<SharedOverride>,
}

impl OverrideChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an override.
    pub fn push<O: CapabilityOverride + 'static>(&mut self, o: O) {
        self.overrides.push(Arc::new(o));
    }

    /// Append a shared override.
    pub fn push_shared(&mut self, o: SharedOverride) {
        self.overrides.push(o);
    }

    /// Append an override, builder style.
    pub fn with<O: CapabilityOverride + 'static>(mut self, o: O) -> Self {
        self.push(o);
        self
    }

    /// Get the number of overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Get override names in order.
    pub fn names(&self) -> Vec<String> {
        self.overrides.iter().map(|o| o.name().to_string()).collect()
    }

    /// Run the chain over a resolved set.
    pub fn apply(&self, request: &Request<'_>, resolved: CapabilitySet) -> CapabilitySet {
        let result = self
            .overrides
            .iter()
            .filter(|o| o.applies_to(request))
            .fold(resolved, |set, o| o.apply(request, set));

        if result.is_empty() {
            CapabilitySet::deny()
        } else {
            result
        }
    }
}

impl fmt::Debug for OverrideChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideChain")
            .field("overrides", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identity;
    use keygate_capability::standard_ids;

    #[test]
    fn test_empty_chain_is_identity() {
        let guest = Identity::guest();
        let request = Request::new(Action::Spectate, ObjectKind::Forum, &guest);
        let chain = OverrideChain::new();

        let resolved = CapabilitySet::single(standard_ids::SPECTATE);
        assert_eq!(chain.apply(&request, resolved.clone()), resolved);
    }

    #[test]
    fn test_require_override_scoped_to_kind() {
        let guest = Identity::guest();
        let chain = OverrideChain::new().with(
            RequireOverride::new(Action::DeleteOthers, standard_ids::KEEP_GATE)
                .for_kind(ObjectKind::Forum),
        );

        let forum = Request::new(Action::DeleteOthers, ObjectKind::Forum, &guest);
        let topic = Request::new(Action::DeleteOthers, ObjectKind::Topic, &guest);
        let resolved = CapabilitySet::single(ObjectKind::Forum.caps().delete_others.clone());

        assert_eq!(
            chain.apply(&forum, resolved.clone()),
            CapabilitySet::single(standard_ids::KEEP_GATE)
        );
        assert_eq!(chain.apply(&topic, resolved.clone()), resolved);
    }

    #[test]
    fn test_require_override_keeps_deny() {
        let guest = Identity::guest();
        let request = Request::new(Action::Publish, ObjectKind::Topic, &guest);
        let chain =
            OverrideChain::new().with(RequireOverride::new(Action::Publish, standard_ids::SPECTATE));

        assert!(chain.apply(&request, CapabilitySet::deny()).is_deny());
    }

    #[test]
    fn test_chain_runs_in_order() {
        let guest = Identity::guest();
        let request = Request::new(Action::Publish, ObjectKind::Topic, &guest);
        let chain = OverrideChain::new()
            .with(FnOverride::new("participate", |_: &Request<'_>, _| {
                CapabilitySet::single(standard_ids::PARTICIPATE)
            }))
            .with(FnOverride::new("also-throttle", |_: &Request<'_>, mut set: CapabilitySet| {
                set.insert(standard_ids::THROTTLE);
                set
            }));

        let result = chain.apply(&request, CapabilitySet::single(standard_ids::MODERATE));
        assert_eq!(chain.names(), vec!["participate", "also-throttle"]);
        assert!(result.contains(&standard_ids::PARTICIPATE));
        assert!(result.contains(&standard_ids::THROTTLE));
        assert!(!result.contains(&standard_ids::MODERATE));
    }

    #[test]
    fn test_empty_result_fails_closed() {
        let guest = Identity::guest();
        let request = Request::new(Action::Spectate, ObjectKind::Forum, &guest);
        let chain = OverrideChain::new().with(FnOverride::new("clear", |_: &Request<'_>, _| {
            CapabilitySet::new()
        }));

        assert!(
            chain
                .apply(&request, CapabilitySet::single(standard_ids::SPECTATE))
                .is_deny()
        );
    }
}
