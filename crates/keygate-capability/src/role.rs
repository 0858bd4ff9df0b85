//! Forum roles and the primitives each one grants.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityId, ObjectKind, standard_ids};
use crate::error::CapabilityError;
use crate::set::CapabilitySet;

/// A forum role.
///
/// Roles are not hierarchical; each one carries a fixed table of primitive
/// capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control over the forums.
    Keymaster,
    /// Moderates all forums.
    Moderator,
    /// Regular member who can post.
    #[default]
    Participant,
    /// Read-only member.
    Spectator,
    /// Member with no forum capabilities at all.
    Blocked,
}

impl Role {
    /// All roles, most to least privileged.
    pub const ALL: [Role; 5] = [
        Role::Keymaster,
        Role::Moderator,
        Role::Participant,
        Role::Spectator,
        Role::Blocked,
    ];

    /// Get the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Keymaster => "keymaster",
            Role::Moderator => "moderator",
            Role::Participant => "participant",
            Role::Spectator => "spectator",
            Role::Blocked => "blocked",
        }
    }

    /// Get the primitive capabilities granted by this role.
    pub fn capabilities(&self) -> CapabilitySet {
        let forum = ObjectKind::Forum.caps();
        let topic = ObjectKind::Topic.caps();
        let reply = ObjectKind::Reply.caps();

        let caps: Vec<CapabilityId> = match self {
            Role::Keymaster => {
                let mut caps = vec![
                    standard_ids::KEEP_GATE,
                    standard_ids::SPECTATE,
                    standard_ids::PARTICIPATE,
                    standard_ids::MODERATE,
                    standard_ids::THROTTLE,
                    standard_ids::VIEW_TRASH,
                    standard_ids::ASSIGN_MODERATORS,
                ];
                for kind in ObjectKind::ALL {
                    caps.extend(kind.caps().iter().cloned());
                }
                caps
            }
            Role::Moderator => vec![
                standard_ids::SPECTATE,
                standard_ids::PARTICIPATE,
                standard_ids::MODERATE,
                standard_ids::THROTTLE,
                standard_ids::VIEW_TRASH,
                forum.publish.clone(),
                forum.edit.clone(),
                forum.read_private.clone(),
                forum.read_hidden.clone(),
                topic.publish.clone(),
                topic.edit.clone(),
                topic.edit_others.clone(),
                topic.delete.clone(),
                topic.delete_others.clone(),
                topic.read_private.clone(),
                reply.publish.clone(),
                reply.edit.clone(),
                reply.edit_others.clone(),
                reply.delete.clone(),
                reply.delete_others.clone(),
                reply.read_private.clone(),
            ],
            Role::Participant => vec![
                standard_ids::SPECTATE,
                standard_ids::PARTICIPATE,
                forum.read_private.clone(),
                topic.publish.clone(),
                topic.edit.clone(),
                reply.publish.clone(),
                reply.edit.clone(),
            ],
            Role::Spectator => vec![standard_ids::SPECTATE],
            Role::Blocked => Vec::new(),
        };

        caps.into_iter().collect()
    }

    /// Check if this role grants a primitive capability.
    pub fn grants(&self, id: &CapabilityId) -> bool {
        !id.is_deny() && self.capabilities().contains(id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keymaster" => Ok(Role::Keymaster),
            "moderator" => Ok(Role::Moderator),
            "participant" => Ok(Role::Participant),
            "spectator" => Ok(Role::Spectator),
            "blocked" => Ok(Role::Blocked),
            other => Err(CapabilityError::UnknownRole(other.to_string())),
        }
    }
}

/// Maps roles of the surrounding site onto forum roles.
///
/// By default site administrators become keymasters and every other known
/// site role maps to the default forum role, as does any role the map has
/// never heard of. [`RoleMap::with_mapping`] can change any of these,
/// including the administrator mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    default_role: Role,
    mappings: BTreeMap<String, Role>,
}

impl RoleMap {
    /// Create the standard map with the given default forum role.
    pub fn new(default_role: Role) -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert("administrator".to_string(), Role::Keymaster);
        for site_role in ["editor", "author", "contributor", "subscriber"] {
            mappings.insert(site_role.to_string(), default_role);
        }
        Self {
            default_role,
            mappings,
        }
    }

    /// Override the forum role for a site role.
    pub fn with_mapping(mut self, site_role: impl Into<String>, role: Role) -> Self {
        self.mappings.insert(site_role.into(), role);
        self
    }

    /// Get the default forum role.
    pub fn default_role(&self) -> Role {
        self.default_role
    }

    /// Map a site role to a forum role.
    pub fn map(&self, site_role: Option<&str>) -> Role {
        site_role
            .and_then(|r| self.mappings.get(r).copied())
            .unwrap_or(self.default_role)
    }
}

impl Default for RoleMap {
    fn default() -> Self {
        Self::new(Role::default())
    }
}
