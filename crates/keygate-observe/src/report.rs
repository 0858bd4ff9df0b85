//! Decision records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keygate_capability::ObjectKind;
use keygate_core::{Action, Decision, ObjectId, Surface};

/// Unique identifier for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Create a new random decision ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete, auditable record of one decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique decision ID.
    pub decision_id: DecisionId,
    /// Who asked, rendered as `guest` or `user:N`.
    pub identity: String,
    /// The meta action.
    pub action: Action,
    /// The content kind.
    pub kind: ObjectKind,
    /// Target object, if any.
    pub object: Option<ObjectId>,
    /// Where the request came from.
    pub surface: Surface,
    /// The decision.
    pub decision: Decision,
}

impl DecisionRecord {
    /// Create a new decision record.
    pub fn new(
        identity: impl Into<String>,
        action: Action,
        kind: ObjectKind,
        object: Option<ObjectId>,
        surface: Surface,
        decision: Decision,
    ) -> Self {
        Self {
            decision_id: DecisionId::new(),
            identity: identity.into(),
            action,
            kind,
            object,
            surface,
            decision,
        }
    }

    /// Check if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Decision: {}\n", self.decision_id));
        output.push_str(&format!("Identity: {}\n", self.identity));
        output.push_str(&format!("Action:   {} {}", self.action, self.kind));
        if let Some(object) = self.object {
            output.push_str(&format!(" #{}", object));
        }
        if self.surface == Surface::Admin {
            output.push_str(" (admin)");
        }
        output.push('\n');
        output.push_str(&format!("Requires: {}\n", self.decision.required()));

        match self.decision.reason() {
            None => output.push_str("Outcome:  allowed\n"),
            Some(reason) => output.push_str(&format!("Outcome:  denied ({})\n", reason)),
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_capability::{CapabilitySet, standard_ids};
    use keygate_core::DenialReason;

    fn record(decision: Decision) -> DecisionRecord {
        DecisionRecord::new(
            "user:2",
            Action::Edit,
            ObjectKind::Topic,
            Some(ObjectId::new(10)),
            Surface::Admin,
            decision,
        )
    }

    #[test]
    fn test_decision_id() {
        assert_ne!(DecisionId::new(), DecisionId::new());
    }

    #[test]
    fn test_to_text() {
        let text = record(Decision::Denied {
            required: CapabilitySet::single(ObjectKind::Topic.caps().edit_others.clone()),
            reason: DenialReason::MissingCapability,
        })
        .to_text();

        assert!(text.contains("user:2"));
        assert!(text.contains("edit topic #10 (admin)"));
        assert!(text.contains("edit_others_topics"));
        assert!(text.contains("denied (missing required capability)"));
    }

    #[test]
    fn test_to_json() {
        let record = record(Decision::Allowed {
            required: CapabilitySet::single(standard_ids::SPECTATE),
        });
        assert!(record.is_allowed());

        let json = record.to_json();
        assert_eq!(json["action"], "edit");
        assert_eq!(json["kind"], "topic");
        assert_eq!(json["object"], 10);
        assert_eq!(json["decision"]["Allowed"]["required"][0], "spectate");
    }
}
