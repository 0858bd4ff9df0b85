//! Role assignment.
//!
//! `RoleRegistry` records which forum role each user holds. It is safe to
//! share across request threads; lookups never block each other.

use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::{CapabilityError, CapabilityResult};
use crate::role::{Role, RoleMap};
use crate::set::CapabilitySet;
use crate::user::UserId;

/// Concurrent store of user → forum role assignments.
#[derive(Default)]
pub struct RoleRegistry {
    assignments: DashMap<UserId, Role>,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            assignments: DashMap::new(),
        }
    }

    /// Assign a role, returning the role previously held.
    pub fn assign(&self, user: UserId, role: Role) -> Option<Role> {
        let previous = self.assignments.insert(user, role);
        info!(user = %user, role = %role, previous = ?previous, "Role assigned");
        previous
    }

    /// Set or clear a user's role.
    ///
    /// Returns the new role only when it differs from the current one;
    /// `None` means nothing changed or the role was cleared.
    pub fn set_role(&self, user: UserId, new_role: Option<Role>) -> Option<Role> {
        let current = self.role_of(user);
        if current == new_role {
            debug!(user = %user, "Role unchanged");
            return None;
        }

        match new_role {
            Some(role) => {
                self.assign(user, role);
            }
            None => {
                self.revoke(user);
            }
        }
        new_role
    }

    /// Give a user the mapped default role if they have none yet.
    ///
    /// Inactive users and users who already hold a role are left alone.
    /// Returns the role that was assigned, if any.
    pub fn ensure_default_role(
        &self,
        user: UserId,
        site_role: Option<&str>,
        role_map: &RoleMap,
        active: bool,
    ) -> Option<Role> {
        if !active || self.assignments.contains_key(&user) {
            return None;
        }

        let role = role_map.map(site_role);
        self.assign(user, role);
        Some(role)
    }

    /// Remove a user's role.
    pub fn revoke(&self, user: UserId) -> Option<Role> {
        self.assignments.remove(&user).map(|(_, role)| {
            info!(user = %user, role = %role, "Role revoked");
            role
        })
    }

    /// Get a user's role.
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        self.assignments.get(&user).map(|r| *r.value())
    }

    /// Get a user's role, failing if they have none.
    pub fn require_role(&self, user: UserId) -> CapabilityResult<Role> {
        self.role_of(user).ok_or(CapabilityError::NoRole(user))
    }

    /// Get the primitives a user holds through their role.
    ///
    /// Users without a role hold nothing.
    pub fn grants_for(&self, user: UserId) -> CapabilitySet {
        self.role_of(user)
            .map(|role| role.capabilities())
            .unwrap_or_default()
    }

    /// List the users holding a role, in ID order.
    pub fn members_of(&self, role: Role) -> Vec<UserId> {
        let mut members: Vec<UserId> = self
            .assignments
            .iter()
            .filter(|entry| *entry.value() == role)
            .map(|entry| *entry.key())
            .collect();
        members.sort();
        members
    }

    /// Get the number of users with a role.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Check if no user has a role.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl Clone for RoleRegistry {
    fn clone(&self) -> Self {
        let new_registry = Self::new();
        for entry in self.assignments.iter() {
            new_registry.assignments.insert(*entry.key(), *entry.value());
        }
        new_registry
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("assignments", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::standard_ids;

    #[test]
    fn test_empty_registry() {
        let registry = RoleRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.role_of(UserId::new(1)), None);
        assert!(registry.grants_for(UserId::new(1)).is_empty());
    }

    #[test]
    fn test_assign_and_replace() {
        let registry = RoleRegistry::new();
        assert_eq!(registry.assign(UserId::new(1), Role::Participant), None);
        assert_eq!(
            registry.assign(UserId::new(1), Role::Moderator),
            Some(Role::Participant)
        );
        assert_eq!(registry.role_of(UserId::new(1)), Some(Role::Moderator));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_role_reports_changes_only() {
        let registry = RoleRegistry::new();
        let user = UserId::new(7);

        assert_eq!(registry.set_role(user, Some(Role::Spectator)), Some(Role::Spectator));
        assert_eq!(registry.set_role(user, Some(Role::Spectator)), None);
        assert_eq!(registry.set_role(user, None), None);
        assert_eq!(registry.role_of(user), None);
    }

    #[test]
    fn test_ensure_default_role() {
        let registry = RoleRegistry::new();
        let map = RoleMap::default();

        assert_eq!(
            registry.ensure_default_role(UserId::new(1), Some("administrator"), &map, true),
            Some(Role::Keymaster)
        );
        // Already has a role.
        assert_eq!(
            registry.ensure_default_role(UserId::new(1), Some("subscriber"), &map, true),
            None
        );
        // Inactive users get nothing.
        assert_eq!(
            registry.ensure_default_role(UserId::new(2), Some("subscriber"), &map, false),
            None
        );
        assert_eq!(registry.role_of(UserId::new(2)), None);
    }

    #[test]
    fn test_grants_follow_role() {
        let registry = RoleRegistry::new();
        registry.assign(UserId::new(3), Role::Moderator);

        let grants = registry.grants_for(UserId::new(3));
        assert!(grants.contains(&standard_ids::MODERATE));
        assert!(registry.require_role(UserId::new(4)).is_err());
    }

    #[test]
    fn test_members_of_sorted() {
        let registry = RoleRegistry::new();
        registry.assign(UserId::new(9), Role::Moderator);
        registry.assign(UserId::new(2), Role::Moderator);
        registry.assign(UserId::new(5), Role::Participant);

        assert_eq!(
            registry.members_of(Role::Moderator),
            vec![UserId::new(2), UserId::new(9)]
        );
    }

    #[test]
    fn test_clone() {
        let registry = RoleRegistry::new();
        registry.assign(UserId::new(1), Role::Keymaster);

        let cloned = registry.clone();
        assert_eq!(cloned.role_of(UserId::new(1)), Some(Role::Keymaster));
    }
}
