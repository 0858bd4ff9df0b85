//! Primitive capability names and per-kind capability namespaces.
//!
//! A primitive capability is an atomic permission name (for example
//! `edit_forums`) that the role layer grants directly to users. Meta actions
//! such as "edit this reply" are narrowed down to primitives by the resolver
//! in `keygate-core`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Name of a primitive capability.
///
/// # Example
///
/// ```
/// use keygate_capability::CapabilityId;
///
/// let edit = CapabilityId::new("edit_forums");
/// let read = CapabilityId::new("read_private_forums");
///
/// assert_ne!(edit, read);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(Cow<'static, str>);

impl CapabilityId {
    /// Create a new capability ID.
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// Create a capability ID from a static name in a const context.
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Parse and validate a capability name.
    ///
    /// Names are non-empty and made of lowercase ASCII letters, digits and
    /// underscores.
    pub fn parse(id: &str) -> Result<Self, CapabilityError> {
        let valid = !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if valid {
            Ok(Self::new(id.to_string()))
        } else {
            Err(CapabilityError::InvalidName(id.to_string()))
        }
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the universal-deny primitive.
    pub fn is_deny(&self) -> bool {
        *self == standard_ids::DO_NOT_ALLOW
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for CapabilityId {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CapabilityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Standard primitive capabilities shared by every content kind.
pub mod standard_ids {
    use super::CapabilityId;

    /// Read public forum content.
    pub const SPECTATE: CapabilityId = CapabilityId::from_static("spectate");

    /// Create and reply to content.
    pub const PARTICIPATE: CapabilityId = CapabilityId::from_static("participate");

    /// Moderate content across the forums.
    pub const MODERATE: CapabilityId = CapabilityId::from_static("moderate");

    /// Post without flood throttling.
    pub const THROTTLE: CapabilityId = CapabilityId::from_static("throttle");

    /// View trashed content.
    pub const VIEW_TRASH: CapabilityId = CapabilityId::from_static("view_trash");

    /// Assign per-forum moderators.
    pub const ASSIGN_MODERATORS: CapabilityId = CapabilityId::from_static("assign_moderators");

    /// Keymaster-equivalent administrative capability.
    pub const KEEP_GATE: CapabilityId = CapabilityId::from_static("keep_gate");

    /// Universal deny. No role ever holds it.
    pub const DO_NOT_ALLOW: CapabilityId = CapabilityId::from_static("do_not_allow");
}

/// Kind of content a capability applies to.
///
/// Each kind owns its own namespace of primitives (`edit_forums`,
/// `edit_topics`, `edit_replies`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A forum, the container of topics.
    Forum,
    /// A topic inside a forum.
    Topic,
    /// A reply inside a topic.
    Reply,
}

impl ObjectKind {
    /// All content kinds.
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Forum, ObjectKind::Topic, ObjectKind::Reply];

    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Forum => "forum",
            ObjectKind::Topic => "topic",
            ObjectKind::Reply => "reply",
        }
    }

    /// Get the primitive capability namespace for this kind.
    pub fn caps(&self) -> &'static KindCapabilities {
        match self {
            ObjectKind::Forum => &FORUM_CAPS,
            ObjectKind::Topic => &TOPIC_CAPS,
            ObjectKind::Reply => &REPLY_CAPS,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forum" => Ok(ObjectKind::Forum),
            "topic" => Ok(ObjectKind::Topic),
            "reply" => Ok(ObjectKind::Reply),
            other => Err(CapabilityError::UnknownKind(other.to_string())),
        }
    }
}

/// The primitive capabilities of one content kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCapabilities {
    /// Edit own content.
    pub edit: CapabilityId,
    /// Edit content owned by others.
    pub edit_others: CapabilityId,
    /// Publish new content.
    pub publish: CapabilityId,
    /// Read private content.
    pub read_private: CapabilityId,
    /// Read hidden content.
    pub read_hidden: CapabilityId,
    /// Delete own content.
    pub delete: CapabilityId,
    /// Delete content owned by others.
    pub delete_others: CapabilityId,
}

static FORUM_CAPS: KindCapabilities = KindCapabilities::namespace(
    "edit_forums",
    "edit_others_forums",
    "publish_forums",
    "read_private_forums",
    "read_hidden_forums",
    "delete_forums",
    "delete_others_forums",
);

static TOPIC_CAPS: KindCapabilities = KindCapabilities::namespace(
    "edit_topics",
    "edit_others_topics",
    "publish_topics",
    "read_private_topics",
    "read_hidden_topics",
    "delete_topics",
    "delete_others_topics",
);

static REPLY_CAPS: KindCapabilities = KindCapabilities::namespace(
    "edit_replies",
    "edit_others_replies",
    "publish_replies",
    "read_private_replies",
    "read_hidden_replies",
    "delete_replies",
    "delete_others_replies",
);

impl KindCapabilities {
    const fn namespace(
        edit: &'static str,
        edit_others: &'static str,
        publish: &'static str,
        read_private: &'static str,
        read_hidden: &'static str,
        delete: &'static str,
        delete_others: &'static str,
    ) -> Self {
        Self {
            edit: CapabilityId::from_static(edit),
            edit_others: CapabilityId::from_static(edit_others),
            publish: CapabilityId::from_static(publish),
            read_private: CapabilityId::from_static(read_private),
            read_hidden: CapabilityId::from_static(read_hidden),
            delete: CapabilityId::from_static(delete),
            delete_others: CapabilityId::from_static(delete_others),
        }
    }

    /// Iterate over every primitive in the namespace.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityId> {
        [
            &self.edit,
            &self.edit_others,
            &self.publish,
            &self.read_private,
            &self.read_hidden,
            &self.delete,
            &self.delete_others,
        ]
        .into_iter()
    }
}
