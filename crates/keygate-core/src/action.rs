//! Meta actions a caller can ask about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// A semantic request that the resolver narrows to primitive capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a specific object.
    Read,
    /// Read private content of a kind.
    ReadPrivate,
    /// Read hidden content of a kind.
    ReadHidden,
    /// Publish new content of a kind.
    Publish,
    /// Edit a specific object, or reach the admin list screen without one.
    Edit,
    /// Edit content owned by others.
    EditOthers,
    /// Delete a specific object.
    Delete,
    /// Delete content owned by others.
    DeleteOthers,
    /// Moderate, optionally scoped to an object.
    Moderate,
    /// Administer the forums.
    Administer,
    /// Take part as a viewer at all.
    Spectate,
    /// Take part as a poster at all.
    Participate,
}

/// Whether an action needs a concrete object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectScope {
    /// The object is mandatory.
    Required,
    /// The object narrows the answer when present.
    Optional,
    /// The object is ignored.
    None,
}

impl Action {
    /// All actions.
    pub const ALL: [Action; 12] = [
        Action::Read,
        Action::ReadPrivate,
        Action::ReadHidden,
        Action::Publish,
        Action::Edit,
        Action::EditOthers,
        Action::Delete,
        Action::DeleteOthers,
        Action::Moderate,
        Action::Administer,
        Action::Spectate,
        Action::Participate,
    ];

    /// Get the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::ReadPrivate => "read_private",
            Action::ReadHidden => "read_hidden",
            Action::Publish => "publish",
            Action::Edit => "edit",
            Action::EditOthers => "edit_others",
            Action::Delete => "delete",
            Action::DeleteOthers => "delete_others",
            Action::Moderate => "moderate",
            Action::Administer => "administer",
            Action::Spectate => "spectate",
            Action::Participate => "participate",
        }
    }

    /// How this action uses the target object.
    pub fn object_scope(&self) -> ObjectScope {
        match self {
            Action::Read | Action::Delete => ObjectScope::Required,
            Action::Edit | Action::EditOthers | Action::DeleteOthers | Action::Moderate => {
                ObjectScope::Optional
            }
            Action::ReadPrivate
            | Action::ReadHidden
            | Action::Publish
            | Action::Administer
            | Action::Spectate
            | Action::Participate => ObjectScope::None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ResolveError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = "promote".parse::<Action>().unwrap_err();
        assert!(matches!(err, ResolveError::UnknownAction(ref name) if name == "promote"));
    }

    #[test]
    fn test_object_scope() {
        assert_eq!(Action::Read.object_scope(), ObjectScope::Required);
        assert_eq!(Action::Delete.object_scope(), ObjectScope::Required);
        assert_eq!(Action::Moderate.object_scope(), ObjectScope::Optional);
        assert_eq!(Action::Publish.object_scope(), ObjectScope::None);
    }
}
