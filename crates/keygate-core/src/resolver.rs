//! The capability resolver.
//!
//! Given an action, a content kind, an identity and optionally a target
//! object, the resolver answers "which primitive capabilities must this
//! identity hold?". It does not answer yes or no; that is the gate's job,
//! which checks the answer against the identity's grants.
//!
//! # Rules
//!
//! Inactive identities get `{do_not_allow}` for everything, before any other
//! rule runs. After that:
//!
//! | action          | narrowing                                                     |
//! |-----------------|---------------------------------------------------------------|
//! | `administer`    | `keep_gate`                                                   |
//! | `read`          | public, own or moderated → `spectate`; hidden → `read_hidden_*`; anything else → `read_private_*` |
//! | `read_private`  | global moderators → `moderate`, else `read_private_*`         |
//! | `read_hidden`   | global moderators → `moderate`, else `read_hidden_*`          |
//! | `publish`       | global moderators → `moderate`, else `publish_*`              |
//! | `edit`          | no object → `keep_gate`; own (front end) → `edit_*`; moderated → `spectate`; else `edit_others_*` |
//! | `edit_others`   | no object → `keep_gate`; moderated → `spectate`; else `edit_others_*` |
//! | `delete`        | own → `delete_*`, else `delete_others_*`                      |
//! | `delete_others` | `delete_others_*`                                             |
//! | `moderate`      | per-forum moderator of the object → `spectate`, else `moderate` |
//!
//! A topic or reply is moderated by the moderators of its enclosing forum.

use std::sync::Arc;

use keygate_capability::{
    CapabilityId, CapabilitySet, KindCapabilities, ObjectKind, UserId, standard_ids,
};

use crate::action::{Action, ObjectScope};
use crate::config::FeatureFlags;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{ContentObject, Identity, ObjectId, Status, Surface};
use crate::store::{
    ForumModerators, ModeratorLookup, ObjectStore, allow_forums_of_user, enclosing_forum,
    is_forum_moderator, moderated_forum_ids,
};

/// A resolution request.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// The meta action being asked about.
    pub action: Action,
    /// The content kind whose primitives apply.
    pub kind: ObjectKind,
    /// Who is asking.
    pub identity: &'a Identity,
    /// The target object, if the question is about one.
    pub object: Option<&'a ContentObject>,
    /// Where the request comes from.
    pub surface: Surface,
}

impl<'a> Request<'a> {
    /// Create a front-end request with no target object.
    pub fn new(action: Action, kind: ObjectKind, identity: &'a Identity) -> Self {
        Self {
            action,
            kind,
            identity,
            object: None,
            surface: Surface::Front,
        }
    }

    /// Target an object.
    pub fn with_object(mut self, object: &'a ContentObject) -> Self {
        self.object = Some(object);
        self
    }

    /// Target an optional object.
    pub fn with_optional_object(mut self, object: Option<&'a ContentObject>) -> Self {
        self.object = object;
        self
    }

    /// Set the surface.
    pub fn on_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    fn require_object(&self) -> ResolveResult<&'a ContentObject> {
        self.object.ok_or(ResolveError::MissingObject {
            action: self.action,
        })
    }
}

/// Narrows meta actions to primitive capabilities.
///
/// The resolver is a pure function of its inputs, its feature flags and the
/// read-only collaborators it was built with. It is cheap to clone and safe
/// to share between threads.
///
/// # Example
///
/// ```
/// use keygate_core::prelude::*;
///
/// let resolver = Resolver::new(FeatureFlags::default());
/// let forum = ContentObject::forum(1, 1).with_status(Status::Hidden);
/// let visitor = Identity::active(UserId::new(2), CapabilitySet::new());
///
/// let required = resolver
///     .resolve(Action::Read, ObjectKind::Forum, &visitor, Some(&forum))
///     .unwrap();
/// assert!(required.contains(&ObjectKind::Forum.caps().read_hidden));
/// ```
#[derive(Clone)]
pub struct Resolver {
    flags: FeatureFlags,
    store: Option<Arc<dyn ObjectStore>>,
    moderators: Option<Arc<dyn ModeratorLookup>>,
}

impl Resolver {
    /// Create a resolver with no collaborators.
    ///
    /// Without an object store, topics and replies cannot be traced back to
    /// their forum, so per-forum moderators never apply to them.
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            flags,
            store: None,
            moderators: None,
        }
    }

    /// Use an object store to find enclosing forums.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a moderator lookup for forum moderator sets.
    pub fn with_moderator_lookup(mut self, lookup: Arc<dyn ModeratorLookup>) -> Self {
        self.moderators = Some(lookup);
        self
    }

    /// Get the feature flags.
    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// Get the object store, if any.
    pub fn store(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.store.as_ref()
    }

    /// Resolve a front-end request.
    pub fn resolve(
        &self,
        action: Action,
        kind: ObjectKind,
        identity: &Identity,
        object: Option<&ContentObject>,
    ) -> ResolveResult<CapabilitySet> {
        self.resolve_request(&Request::new(action, kind, identity).with_optional_object(object))
    }

    /// Resolve a request.
    pub fn resolve_request(&self, request: &Request<'_>) -> ResolveResult<CapabilitySet> {
        let identity = request.identity;

        if identity.is_inactive() {
            return Ok(CapabilitySet::deny());
        }

        if let Some(object) = request.object {
            if object.kind != request.kind {
                return Err(ResolveError::KindMismatch {
                    expected: request.kind,
                    actual: object.kind,
                });
            }
        }

        let object = match request.action.object_scope() {
            ObjectScope::Required => Some(request.require_object()?),
            ObjectScope::Optional => request.object,
            ObjectScope::None => None,
        };
        let caps = request.kind.caps();

        let required = match (request.action, object) {
            (Action::Spectate, _) => standard_ids::SPECTATE,
            (Action::Participate, _) => standard_ids::PARTICIPATE,
            (Action::Administer, _) => standard_ids::KEEP_GATE,

            (Action::Read, Some(object)) => self.read(identity, object, caps),
            (Action::ReadPrivate, _) => self.moderator_or(identity, &caps.read_private),
            (Action::ReadHidden, _) => self.moderator_or(identity, &caps.read_hidden),
            (Action::Publish, _) => self.moderator_or(identity, &caps.publish),

            // Object-less edits are the admin list screens.
            (Action::Edit | Action::EditOthers, None) => standard_ids::KEEP_GATE,
            (Action::Edit, Some(object)) => self.edit(request.surface, identity, object, caps),
            (Action::EditOthers, Some(object)) => {
                if self.can_moderate(identity, object) {
                    standard_ids::SPECTATE
                } else {
                    caps.edit_others.clone()
                }
            }

            (Action::Delete, Some(object)) => {
                if object.is_owned_by(identity) {
                    caps.delete.clone()
                } else {
                    caps.delete_others.clone()
                }
            }
            (Action::DeleteOthers, _) => caps.delete_others.clone(),

            (Action::Moderate, object) => self.moderate(identity, object),

            (Action::Read | Action::Delete, None) => {
                return Err(ResolveError::MissingObject {
                    action: request.action,
                });
            }
        };

        Ok(CapabilitySet::single(required))
    }

    /// Check if the identity moderates the object, globally or per forum.
    pub fn can_moderate(&self, identity: &Identity, object: &ContentObject) -> bool {
        identity.satisfies(&CapabilitySet::single(self.moderate(identity, Some(object))))
    }

    /// Check if the identity is a per-forum moderator of the object.
    ///
    /// Forums use their own moderator set plus the lookup's; topics and
    /// replies use the set of their enclosing forum.
    pub fn is_object_moderator(&self, identity: &Identity, object: &ContentObject) -> bool {
        if !self.flags.per_object_moderation {
            return false;
        }
        let Some(user) = identity.user_id() else {
            return false;
        };

        if object.kind == ObjectKind::Forum && object.moderators.contains(&user) {
            return true;
        }

        let forum_id = match object.kind {
            ObjectKind::Forum => Some(object.id),
            ObjectKind::Topic | ObjectKind::Reply => self
                .store
                .as_deref()
                .and_then(|store| enclosing_forum(store, object)),
        };
        let Some(forum_id) = forum_id else {
            return false;
        };

        self.with_lookup(|lookup| is_forum_moderator(&self.flags, lookup, user, forum_id))
            .unwrap_or(false)
    }

    /// List the forums a user is assigned to moderate.
    ///
    /// Empty without an object store to enumerate forums from.
    pub fn moderated_forums(&self, user: UserId) -> Vec<ObjectId> {
        let Some(store) = self.store.as_deref() else {
            return Vec::new();
        };
        self.with_lookup(|lookup| moderated_forum_ids(store, lookup, user))
            .unwrap_or_default()
    }

    /// Remove from a listing's excluded forums the ones a user moderates.
    pub fn allow_forums_of_user(&self, excluded: &[ObjectId], user: UserId) -> Vec<ObjectId> {
        self.with_lookup(|lookup| allow_forums_of_user(&self.flags, lookup, excluded, user))
            .unwrap_or_else(|| excluded.to_vec())
    }

    /// Run `f` against the configured moderator lookup, falling back to the
    /// forum objects in the store.
    fn with_lookup<R>(&self, f: impl FnOnce(&dyn ModeratorLookup) -> R) -> Option<R> {
        match (&self.moderators, &self.store) {
            (Some(lookup), _) => Some(f(lookup.as_ref())),
            (None, Some(store)) => Some(f(&ForumModerators::new(store.as_ref()))),
            (None, None) => None,
        }
    }

    fn read(
        &self,
        identity: &Identity,
        object: &ContentObject,
        caps: &KindCapabilities,
    ) -> CapabilityId {
        if object.status == Status::Public
            || object.is_owned_by(identity)
            || self.can_moderate(identity, object)
        {
            return standard_ids::SPECTATE;
        }

        match object.status {
            Status::Hidden => caps.read_hidden.clone(),
            // Private, and every status without a read rule of its own.
            _ => caps.read_private.clone(),
        }
    }

    fn edit(
        &self,
        surface: Surface,
        identity: &Identity,
        object: &ContentObject,
        caps: &KindCapabilities,
    ) -> CapabilityId {
        if surface == Surface::Front && object.is_owned_by(identity) {
            caps.edit.clone()
        } else if self.can_moderate(identity, object) {
            standard_ids::SPECTATE
        } else {
            caps.edit_others.clone()
        }
    }

    fn moderate(&self, identity: &Identity, object: Option<&ContentObject>) -> CapabilityId {
        match object {
            Some(object) if self.is_object_moderator(identity, object) => standard_ids::SPECTATE,
            _ => standard_ids::MODERATE,
        }
    }

    fn moderator_or(&self, identity: &Identity, fallback: &CapabilityId) -> CapabilityId {
        if identity.holds(&standard_ids::MODERATE) {
            standard_ids::MODERATE
        } else {
            fallback.clone()
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(FeatureFlags::default())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("flags", &self.flags)
            .field("store", &self.store.is_some())
            .field("moderators", &self.moderators.is_some())
            .finish()
    }
}
