//! Identities and content objects as seen by the resolver.
//!
//! Both are immutable snapshots taken by the caller at request time. The
//! resolver never mutates them and never goes back to storage to refresh them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use keygate_capability::{CapabilityId, CapabilitySet, ObjectKind, UserId};

/// Identifier of a forum, topic or reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Create an object ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric ID.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ObjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standing of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    /// May participate subject to capabilities.
    #[default]
    Active,
    /// Marked as spam or deleted. Denied everything.
    Inactive,
}

/// The requesting identity.
///
/// A guest has no user ID, is always active and can never own content. A
/// user carries the primitives they hold through their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user: Option<UserId>,
    status: IdentityStatus,
    grants: CapabilitySet,
}

impl Identity {
    /// An anonymous visitor holding no primitives.
    pub fn guest() -> Self {
        Self::guest_with(CapabilitySet::new())
    }

    /// An anonymous visitor holding the given primitives.
    pub fn guest_with(grants: CapabilitySet) -> Self {
        Self {
            user: None,
            status: IdentityStatus::Active,
            grants,
        }
    }

    /// A registered user.
    pub fn user(id: UserId, status: IdentityStatus, grants: CapabilitySet) -> Self {
        Self {
            user: Some(id),
            status,
            grants,
        }
    }

    /// An active registered user.
    pub fn active(id: UserId, grants: CapabilitySet) -> Self {
        Self::user(id, IdentityStatus::Active, grants)
    }

    /// An inactive (spam or deleted) registered user.
    pub fn inactive(id: UserId) -> Self {
        Self::user(id, IdentityStatus::Inactive, CapabilitySet::new())
    }

    /// Get the user ID, or `None` for guests.
    pub fn user_id(&self) -> Option<UserId> {
        self.user
    }

    /// Get the identity's standing.
    pub fn status(&self) -> IdentityStatus {
        self.status
    }

    /// Check if the identity is a guest.
    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    /// Check if the identity is inactive.
    pub fn is_inactive(&self) -> bool {
        self.status == IdentityStatus::Inactive
    }

    /// Check if this identity is the given user.
    pub fn is(&self, user: UserId) -> bool {
        self.user == Some(user)
    }

    /// Get the primitives this identity holds.
    pub fn grants(&self) -> &CapabilitySet {
        &self.grants
    }

    /// Check if the identity holds a primitive.
    ///
    /// Inactive identities hold nothing, and nobody holds `do_not_allow`.
    pub fn holds(&self, id: &CapabilityId) -> bool {
        !self.is_inactive() && !id.is_deny() && self.grants.contains(id)
    }

    /// Check if the identity satisfies a resolved requirement.
    pub fn satisfies(&self, required: &CapabilitySet) -> bool {
        !self.is_inactive() && required.satisfied_by(&self.grants)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user {
            Some(id) => write!(f, "user:{}", id),
            None => f.write_str("guest"),
        }
    }
}

/// Lifecycle status of a content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Visible to everyone.
    #[default]
    #[serde(alias = "publish")]
    Public,
    /// Visible to members holding the private-read primitive.
    Private,
    /// Visible to members holding the hidden-read primitive.
    Hidden,
    /// Readable but closed to new replies.
    Closed,
    /// Awaiting approval.
    Pending,
    /// Marked as spam.
    Spam,
    /// In the trash.
    #[serde(alias = "trash")]
    Trashed,
    /// A status the store reported that this crate does not recognise.
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Get the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Public => "public",
            Status::Private => "private",
            Status::Hidden => "hidden",
            Status::Closed => "closed",
            Status::Pending => "pending",
            Status::Spam => "spam",
            Status::Trashed => "trashed",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = std::convert::Infallible;

    /// Unrecognised names parse to [`Status::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "public" | "publish" => Status::Public,
            "private" => Status::Private,
            "hidden" => Status::Hidden,
            "closed" => Status::Closed,
            "pending" => Status::Pending,
            "spam" => Status::Spam,
            "trashed" | "trash" => Status::Trashed,
            _ => Status::Unknown,
        })
    }
}

/// A forum, topic or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentObject {
    /// Object identifier.
    pub id: ObjectId,
    /// Content kind.
    pub kind: ObjectKind,
    /// Current status.
    #[serde(default)]
    pub status: Status,
    /// The user who created the object.
    pub owner: UserId,
    /// Containing object: a topic's forum, a reply's topic, a sub-forum's
    /// parent forum.
    #[serde(default)]
    pub parent: Option<ObjectId>,
    /// Users assigned to moderate this object. Only meaningful for forums.
    #[serde(default)]
    pub moderators: BTreeSet<UserId>,
}

impl ContentObject {
    /// Create a public object with no parent and no moderators.
    pub fn new(id: ObjectId, kind: ObjectKind, owner: UserId) -> Self {
        Self {
            id,
            kind,
            status: Status::Public,
            owner,
            parent: None,
            moderators: BTreeSet::new(),
        }
    }

    /// Shorthand for a new forum.
    pub fn forum(id: u64, owner: u64) -> Self {
        Self::new(ObjectId::new(id), ObjectKind::Forum, UserId::new(owner))
    }

    /// Shorthand for a new topic inside a forum.
    pub fn topic(id: u64, owner: u64, forum: u64) -> Self {
        Self::new(ObjectId::new(id), ObjectKind::Topic, UserId::new(owner))
            .with_parent(ObjectId::new(forum))
    }

    /// Shorthand for a new reply inside a topic.
    pub fn reply(id: u64, owner: u64, topic: u64) -> Self {
        Self::new(ObjectId::new(id), ObjectKind::Reply, UserId::new(owner))
            .with_parent(ObjectId::new(topic))
    }

    /// Set the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a moderator.
    pub fn with_moderator(mut self, user: UserId) -> Self {
        self.moderators.insert(user);
        self
    }

    /// Check if the identity owns this object. Guests own nothing.
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        identity.is(self.owner)
    }
}

/// Where a request comes from.
///
/// The self-edit shortcut only applies on the public front end; the admin
/// area always asks for the stronger primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Public pages.
    #[default]
    Front,
    /// Administrative screens.
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_capability::standard_ids;

    #[test]
    fn test_guest_is_active_and_owns_nothing() {
        let guest = Identity::guest();
        assert!(guest.is_guest());
        assert!(!guest.is_inactive());

        let forum = ContentObject::forum(1, 0);
        assert!(!forum.is_owned_by(&guest));
    }

    #[test]
    fn test_inactive_holds_nothing() {
        let grants: CapabilitySet = [standard_ids::SPECTATE].into_iter().collect();
        let user = Identity::user(UserId::new(4), IdentityStatus::Inactive, grants);

        assert!(!user.holds(&standard_ids::SPECTATE));
        assert!(!user.satisfies(&CapabilitySet::single(standard_ids::SPECTATE)));
    }

    #[test]
    fn test_nobody_holds_do_not_allow() {
        let grants: CapabilitySet = [standard_ids::DO_NOT_ALLOW].into_iter().collect();
        let user = Identity::active(UserId::new(1), grants);
        assert!(!user.holds(&standard_ids::DO_NOT_ALLOW));
    }

    #[test]
    fn test_status_parse_unknown() {
        assert_eq!("hidden".parse::<Status>().unwrap(), Status::Hidden);
        assert_eq!("publish".parse::<Status>().unwrap(), Status::Public);
        assert_eq!("archived".parse::<Status>().unwrap(), Status::Unknown);
    }

    #[test]
    fn test_status_deserialize_unknown() {
        #[derive(Deserialize)]
        struct Wrapper {
            status: Status,
        }
        let w: Wrapper = toml::from_str("status = \"archived\"").unwrap();
        assert_eq!(w.status, Status::Unknown);
    }

    #[test]
    fn test_status_parse_and_deserialize_agree() {
        #[derive(Deserialize)]
        struct Wrapper {
            status: Status,
        }
        let names = [
            "public", "publish", "private", "hidden", "closed", "pending", "spam", "trashed",
            "trash", "unknown", "archived",
        ];
        for name in names {
            let parsed: Status = name.parse().unwrap();
            let w: Wrapper = toml::from_str(&format!("status = \"{}\"", name)).unwrap();
            assert_eq!(w.status, parsed, "status {}", name);
        }
    }

    #[test]
    fn test_object_builders() {
        let reply = ContentObject::reply(30, 2, 20).with_status(Status::Pending);
        assert_eq!(reply.kind, ObjectKind::Reply);
        assert_eq!(reply.parent, Some(ObjectId::new(20)));
        assert_eq!(reply.status, Status::Pending);

        let forum = ContentObject::forum(1, 1).with_moderator(UserId::new(3));
        assert!(forum.moderators.contains(&UserId::new(3)));
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity::guest().to_string(), "guest");
        assert_eq!(Identity::inactive(UserId::new(9)).to_string(), "user:9");
    }
}
