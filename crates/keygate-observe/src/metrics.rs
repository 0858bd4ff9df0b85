//! Metrics collected while authorizing requests.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use keygate_capability::{CapabilityId, CapabilitySet};
use keygate_core::{Action, Decision, DenialReason};

/// Collects decision metrics.
#[derive(Default)]
pub struct DecisionMetrics {
    /// Outcome counters per action name.
    actions: RwLock<BTreeMap<String, ActionCounts>>,
    /// Requirement counters.
    requirements: RwLock<RequirementMetrics>,
    /// Denial reason counters.
    denials: RwLock<DenialMetrics>,
}

impl DecisionMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved requirement.
    pub fn record_requirement(&self, required: &CapabilitySet) {
        let mut requirements = self.requirements.write();
        for id in required {
            *requirements.counts.entry(id.clone()).or_insert(0) += 1;
        }
    }

    /// Record the outcome of a decision.
    pub fn record_decision(&self, action: Action, decision: &Decision) {
        self.record_named_decision(action.as_str(), decision);
    }

    /// Record the outcome of a decision on an action given by name.
    pub fn record_named_decision(&self, action: &str, decision: &Decision) {
        {
            let mut actions = self.actions.write();
            let counts = actions.entry(action.to_string()).or_default();
            if decision.is_allowed() {
                counts.allowed += 1;
            } else {
                counts.denied += 1;
            }
        }

        if let Some(reason) = decision.reason() {
            let mut denials = self.denials.write();
            match reason {
                DenialReason::InactiveIdentity => denials.inactive_identity += 1,
                DenialReason::UniversalDeny => denials.universal_deny += 1,
                DenialReason::MissingCapability => denials.missing_capability += 1,
                DenialReason::Unresolvable(_) => denials.unresolvable += 1,
            }
        }
    }

    /// Record a request that could not be resolved.
    pub fn record_error(&self) {
        self.requirements.write().resolution_errors += 1;
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let actions = self.actions.read().clone();
        let total = actions.values().fold(ActionCounts::default(), |acc, c| ActionCounts {
            allowed: acc.allowed + c.allowed,
            denied: acc.denied + c.denied,
        });

        MetricsSnapshot {
            total,
            actions,
            requirements: self.requirements.read().clone(),
            denials: *self.denials.read(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.actions.write().clear();
        *self.requirements.write() = RequirementMetrics::default();
        *self.denials.write() = DenialMetrics::default();
    }
}

impl std::fmt::Debug for DecisionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionMetrics")
            .field("actions", &*self.actions.read())
            .field("denials", &*self.denials.read())
            .finish()
    }
}

/// Snapshot of collected metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Outcomes across all actions.
    pub total: ActionCounts,
    /// Outcomes per action name.
    pub actions: BTreeMap<String, ActionCounts>,
    /// Requirement metrics.
    pub requirements: RequirementMetrics,
    /// Denial reason metrics.
    pub denials: DenialMetrics,
}

impl MetricsSnapshot {
    /// Get the counters for one action.
    pub fn action(&self, action: Action) -> ActionCounts {
        self.actions.get(action.as_str()).copied().unwrap_or_default()
    }
}

/// Allow and deny counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    /// Allowed requests.
    pub allowed: u64,
    /// Denied requests.
    pub denied: u64,
}

/// Requirement metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementMetrics {
    /// How often each primitive was required.
    pub counts: BTreeMap<CapabilityId, u64>,
    /// Requests that failed to resolve.
    pub resolution_errors: u64,
}

/// Denials by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialMetrics {
    /// Inactive identities.
    pub inactive_identity: u64,
    /// Requirements that resolved to `do_not_allow`.
    pub universal_deny: u64,
    /// Identities without a required primitive.
    pub missing_capability: u64,
    /// Requests that could not be resolved.
    pub unresolvable: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_capability::standard_ids;

    fn allowed() -> Decision {
        Decision::Allowed {
            required: CapabilitySet::single(standard_ids::SPECTATE),
        }
    }

    fn denied(reason: DenialReason) -> Decision {
        Decision::Denied {
            required: CapabilitySet::deny(),
            reason,
        }
    }

    #[test]
    fn test_action_counters() {
        let metrics = DecisionMetrics::new();
        metrics.record_decision(Action::Read, &allowed());
        metrics.record_decision(Action::Read, &allowed());
        metrics.record_decision(Action::Read, &denied(DenialReason::MissingCapability));
        metrics.record_decision(Action::Delete, &denied(DenialReason::InactiveIdentity));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.action(Action::Read), ActionCounts { allowed: 2, denied: 1 });
        assert_eq!(snapshot.action(Action::Delete).denied, 1);
        assert_eq!(snapshot.action(Action::Publish), ActionCounts::default());
        assert_eq!(snapshot.total, ActionCounts { allowed: 2, denied: 2 });
        assert_eq!(snapshot.denials.missing_capability, 1);
        assert_eq!(snapshot.denials.inactive_identity, 1);
    }

    #[test]
    fn test_named_decisions_count_toward_totals() {
        let metrics = DecisionMetrics::new();
        metrics.record_named_decision(
            "fly",
            &denied(DenialReason::Unresolvable("unknown action: fly".to_string())),
        );
        metrics.record_decision(Action::Read, &allowed());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.actions["fly"].denied, 1);
        assert_eq!(snapshot.total, ActionCounts { allowed: 1, denied: 1 });
        assert_eq!(snapshot.denials.unresolvable, 1);
    }

    #[test]
    fn test_requirement_counts() {
        let metrics = DecisionMetrics::new();
        metrics.record_requirement(&CapabilitySet::single(standard_ids::MODERATE));
        metrics.record_requirement(&CapabilitySet::single(standard_ids::MODERATE));
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requirements.counts.get(&standard_ids::MODERATE), Some(&2));
        assert_eq!(snapshot.requirements.resolution_errors, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = DecisionMetrics::new();
        metrics.record_decision(Action::Moderate, &allowed());

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["actions"]["moderate"]["allowed"], 1);
    }

    #[test]
    fn test_reset() {
        let metrics = DecisionMetrics::new();
        metrics.record_decision(Action::Read, &allowed());
        metrics.record_error();

        metrics.reset();

        let snapshot = metrics.snapshot();
        assert!(snapshot.actions.is_empty());
        assert_eq!(snapshot.requirements.resolution_errors, 0);
    }
}
