//! Fixture files for the CLI.
//!
//! A fixture describes users and content in TOML:
//!
//! ```toml
//! [[users]]
//! id = 3
//! role = "participant"
//!
//! [[users]]
//! id = 7
//! site_role = "administrator"
//! status = "inactive"
//!
//! [[objects]]
//! id = 1
//! kind = "forum"
//! status = "private"
//! owner = 1
//! moderators = [3]
//!
//! [[objects]]
//! id = 10
//! kind = "topic"
//! owner = 2
//! parent = 1
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use keygate::prelude::*;

/// Users and content to check requests against.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Known users.
    pub users: Vec<FixtureUser>,
    /// Forums, topics and replies.
    pub objects: Vec<ContentObject>,
}

/// A user in a fixture.
#[derive(Debug, Deserialize)]
pub struct FixtureUser {
    /// User ID.
    pub id: UserId,
    /// Forum role. Takes precedence over `site_role`.
    #[serde(default)]
    pub role: Option<Role>,
    /// Site role, mapped through the configured role map.
    #[serde(default)]
    pub site_role: Option<String>,
    /// Account standing.
    #[serde(default)]
    pub status: IdentityStatus,
}

impl Fixture {
    /// Load a fixture from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture = Self::parse(&content)
            .with_context(|| format!("Invalid fixture {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            users = fixture.users.len(),
            objects = fixture.objects.len(),
            "Fixture loaded"
        );
        Ok(fixture)
    }

    /// Parse a fixture from a TOML string.
    ///
    /// Object and user IDs must be unique.
    pub fn parse(content: &str) -> Result<Self> {
        let fixture: Self = toml::from_str(content)?;

        let mut objects = BTreeSet::new();
        for object in &fixture.objects {
            if !objects.insert(object.id) {
                bail!("Duplicate object ID {}", object.id);
            }
        }
        let mut users = BTreeSet::new();
        for user in &fixture.users {
            if !users.insert(user.id) {
                bail!("Duplicate user ID {}", user.id);
            }
        }

        Ok(fixture)
    }

    /// Build an in-memory store holding the fixture's objects.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_objects(self.objects.iter().cloned()))
    }

    /// Build a runtime over the fixture with roles assigned.
    pub fn runtime(&self, config: KeygateConfig) -> KeygateRuntime {
        let gate = Keygate::builder()
            .with_config(config)
            .with_memory_store(self.store())
            .with_event_subscriber(Arc::new(LoggingSubscriber::new()))
            .build();

        for user in &self.users {
            match user.role {
                Some(role) => {
                    gate.roles().assign(user.id, role);
                }
                None => {
                    gate.register_user(user.id, user.site_role.as_deref(), user.status);
                }
            }
        }
        gate
    }

    /// Snapshot the identity for a user, or a guest when `user` is `None`.
    pub fn identity(&self, gate: &KeygateRuntime, user: Option<u64>) -> Result<Identity> {
        let Some(id) = user.map(UserId::new) else {
            return Ok(Identity::guest());
        };
        match self.users.iter().find(|u| u.id == id) {
            Some(user) => Ok(gate.identity(id, user.status)),
            None => bail!("User {} is not in the fixture", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        [[users]]
        id = 1
        site_role = "administrator"

        [[users]]
        id = 3
        role = "participant"

        [[users]]
        id = 4
        role = "keymaster"
        status = "inactive"

        [[objects]]
        id = 1
        kind = "forum"
        status = "private"
        owner = 1
        moderators = [3]

        [[objects]]
        id = 10
        kind = "topic"
        owner = 2
        parent = 1
    "#;

    #[test]
    fn test_parse_fixture() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        assert_eq!(fixture.users.len(), 3);
        assert_eq!(fixture.objects.len(), 2);

        let store = fixture.store();
        let forum = store.object(ObjectId::new(1)).unwrap();
        assert_eq!(forum.status, Status::Private);
        assert!(forum.moderators.contains(&UserId::new(3)));
        assert_eq!(store.object(ObjectId::new(10)).unwrap().status, Status::Public);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let objects = r#"
            [[objects]]
            id = 1
            kind = "forum"
            owner = 1

            [[objects]]
            id = 1
            kind = "forum"
            status = "hidden"
            owner = 1
        "#;
        let err = Fixture::parse(objects).unwrap_err();
        assert!(err.to_string().contains("Duplicate object ID 1"));

        let users = "[[users]]\nid = 3\n\n[[users]]\nid = 3\n";
        assert!(Fixture::parse(users).is_err());
    }

    #[test]
    fn test_host_status_names() {
        let fixture = Fixture::parse(
            "[[objects]]\nid = 1\nkind = \"forum\"\nstatus = \"publish\"\nowner = 1\n",
        )
        .unwrap();
        let gate = fixture.runtime(KeygateConfig::default());
        let guest = Identity::guest_with(CapabilitySet::single(standard_ids::SPECTATE));

        assert!(gate.can(&guest, Action::Read, ObjectKind::Forum, Some(ObjectId::new(1))));
    }

    #[test]
    fn test_runtime_assigns_roles() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        let gate = fixture.runtime(KeygateConfig::default());

        assert_eq!(gate.roles().role_of(UserId::new(1)), Some(Role::Keymaster));
        assert_eq!(gate.roles().role_of(UserId::new(3)), Some(Role::Participant));
    }

    #[test]
    fn test_identity_lookup() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        let gate = fixture.runtime(KeygateConfig::default());

        assert!(fixture.identity(&gate, None).unwrap().is_guest());
        assert!(fixture.identity(&gate, Some(4)).unwrap().is_inactive());
        assert!(fixture.identity(&gate, Some(99)).is_err());
    }

    #[test]
    fn test_fixture_decisions() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        let gate = fixture.runtime(KeygateConfig::default());
        let moderator = fixture.identity(&gate, Some(3)).unwrap();
        let inactive = fixture.identity(&gate, Some(4)).unwrap();
        let topic = Some(ObjectId::new(10));

        assert!(gate.can(&moderator, Action::Edit, ObjectKind::Topic, topic));
        assert!(!gate.can(&inactive, Action::Read, ObjectKind::Topic, topic));
    }
}
