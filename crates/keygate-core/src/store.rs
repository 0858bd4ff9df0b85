//! Read-only collaborators the resolver consults.
//!
//! The resolver only needs two questions answered: "what is object N?" and
//! "who moderates forum N?". [`MemoryStore`] answers both from memory; real
//! deployments implement the traits over their own storage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;

use keygate_capability::{ObjectKind, UserId};

use crate::config::FeatureFlags;
use crate::model::{ContentObject, ObjectId};

/// Longest parent chain walked when looking for an enclosing forum.
pub const MAX_PARENT_DEPTH: usize = 32;

/// Source of content object snapshots.
pub trait ObjectStore: Send + Sync {
    /// Get an object by ID.
    fn object(&self, id: ObjectId) -> Option<ContentObject>;

    /// Get every forum. Used for moderator reverse lookups.
    fn forums(&self) -> Vec<ContentObject> {
        Vec::new()
    }
}

/// Source of per-forum moderator assignments.
pub trait ModeratorLookup: Send + Sync {
    /// Get the users assigned to moderate a forum.
    fn moderators(&self, forum: ObjectId) -> BTreeSet<UserId>;
}

/// A shared object store.
pub type SharedStore = Arc<dyn ObjectStore>;

/// A shared moderator lookup.
pub type SharedModeratorLookup = Arc<dyn ModeratorLookup>;

/// Find the forum an object belongs to.
///
/// A forum is its own enclosing forum; a topic's is its parent; a reply's is
/// its topic's parent. The walk stops at the first forum, so a sub-forum
/// never resolves to its parent forum. Returns `None` if the chain is broken
/// or longer than [`MAX_PARENT_DEPTH`].
pub fn enclosing_forum(store: &dyn ObjectStore, object: &ContentObject) -> Option<ObjectId> {
    if object.kind == ObjectKind::Forum {
        return Some(object.id);
    }

    let mut parent = object.parent;
    for _ in 0..MAX_PARENT_DEPTH {
        let current = store.object(parent?)?;
        if current.kind == ObjectKind::Forum {
            return Some(current.id);
        }
        parent = current.parent;
    }
    None
}

/// Check if a user moderates a forum.
///
/// Always `false` when per-forum moderation is disabled.
pub fn is_forum_moderator(
    flags: &FeatureFlags,
    lookup: &dyn ModeratorLookup,
    user: UserId,
    forum: ObjectId,
) -> bool {
    flags.per_object_moderation && lookup.moderators(forum).contains(&user)
}

/// List the forums a user is assigned to moderate, in ID order.
///
/// Forums come from the store, assignments from the lookup. The feature flag
/// is not consulted, so this reports assignments even while they are ignored.
pub fn moderated_forum_ids(
    store: &dyn ObjectStore,
    lookup: &dyn ModeratorLookup,
    user: UserId,
) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = store
        .forums()
        .into_iter()
        .map(|forum| forum.id)
        .filter(|id| lookup.moderators(*id).contains(&user))
        .collect();
    ids.sort();
    ids
}

/// Remove from a list of excluded forums the ones a user moderates.
///
/// Listings hide private and hidden forums from most users; a user who
/// moderates one of them should still see it. Returns the list unchanged when
/// per-forum moderation is disabled.
pub fn allow_forums_of_user(
    flags: &FeatureFlags,
    lookup: &dyn ModeratorLookup,
    excluded: &[ObjectId],
    user: UserId,
) -> Vec<ObjectId> {
    if !flags.per_object_moderation {
        return excluded.to_vec();
    }

    excluded
        .iter()
        .copied()
        .filter(|forum| !lookup.moderators(*forum).contains(&user))
        .collect()
}

/// Moderator lookup that reads the `moderators` field of forum objects.
///
/// Used when no dedicated [`ModeratorLookup`] is configured.
pub struct ForumModerators<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ForumModerators<'a> {
    /// Read assignments from the given store.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }
}

impl ModeratorLookup for ForumModerators<'_> {
    fn moderators(&self, forum: ObjectId) -> BTreeSet<UserId> {
        self.store
            .object(forum)
            .filter(|object| object.kind == ObjectKind::Forum)
            .map(|object| object.moderators)
            .unwrap_or_default()
    }
}

/// In-memory object store.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<ObjectId, ContentObject>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given objects.
    pub fn with_objects(objects: impl IntoIterator<Item = ContentObject>) -> Self {
        let store = Self::new();
        for object in objects {
            store.insert(object);
        }
        store
    }

    /// Insert or replace an object, returning the previous version.
    pub fn insert(&self, object: ContentObject) -> Option<ContentObject> {
        self.objects.write().insert(object.id, object)
    }

    /// Remove an object.
    pub fn remove(&self, id: ObjectId) -> Option<ContentObject> {
        self.objects.write().remove(&id)
    }

    /// Assign a moderator to a forum.
    ///
    /// Returns `false` if the forum does not exist or is not a forum.
    pub fn add_moderator(&self, forum: ObjectId, user: UserId) -> bool {
        match self.objects.write().get_mut(&forum) {
            Some(object) if object.kind == ObjectKind::Forum => {
                object.moderators.insert(user);
                true
            }
            _ => false,
        }
    }

    /// Unassign a moderator from a forum.
    pub fn remove_moderator(&self, forum: ObjectId, user: UserId) -> bool {
        self.objects
            .write()
            .get_mut(&forum)
            .map(|object| object.moderators.remove(&user))
            .unwrap_or(false)
    }

    /// Get the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn object(&self, id: ObjectId) -> Option<ContentObject> {
        self.objects.read().get(&id).cloned()
    }

    fn forums(&self) -> Vec<ContentObject> {
        self.objects
            .read()
            .values()
            .filter(|object| object.kind == ObjectKind::Forum)
            .cloned()
            .collect()
    }
}

impl ModeratorLookup for MemoryStore {
    fn moderators(&self, forum: ObjectId) -> BTreeSet<UserId> {
        self.objects
            .read()
            .get(&forum)
            .filter(|object| object.kind == ObjectKind::Forum)
            .map(|object| object.moderators.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("objects", &self.len())
            .finish()
    }
}
