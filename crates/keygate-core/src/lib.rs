//! keygate Core - Capability Resolution for Forum Content
//!
//! This crate decides which primitive capabilities an identity must hold to
//! perform an action on forum content. It includes:
//!
//! - [`Resolver`]: narrows a meta action to primitive capabilities
//! - [`Identity`], [`ContentObject`], [`Status`]: the snapshots it reasons about
//! - [`FeatureFlags`] and [`KeygateConfig`]: installation-wide switches
//! - [`ObjectStore`] and [`ModeratorLookup`]: read-only collaborators
//! - [`OverrideChain`]: post-resolution overrides
//! - [`Decision`]: the final allow/deny outcome
//!
//! # Quick Start
//!
//! ```
//! use keygate_core::prelude::*;
//!
//! let resolver = Resolver::new(FeatureFlags::default());
//!
//! let forum = ContentObject::forum(1, 1)
//!     .with_status(Status::Private)
//!     .with_moderator(UserId::new(3));
//! let moderator = Identity::active(UserId::new(3), Role::Participant.capabilities());
//!
//! let required = resolver
//!     .resolve(Action::Edit, ObjectKind::Forum, &moderator, Some(&forum))
//!     .unwrap();
//! assert!(moderator.satisfies(&required));
//! ```
//!
//! # Fail-closed
//!
//! Every path that cannot produce a meaningful answer produces
//! `{do_not_allow}` or an error that callers must treat as a denial:
//!
//! 1. **Inactive identities** are denied every action
//! 2. **Missing objects** for per-object actions are an error
//! 3. **Unknown statuses** read as private
//! 4. **Unknown action names** fail to parse

pub mod action;
pub mod config;
pub mod decision;
pub mod error;
pub mod model;
pub mod overrides;
pub mod resolver;
pub mod store;

// Re-export main types at crate root
pub use action::{Action, ObjectScope};
pub use config::{FeatureFlags, KeygateConfig};
pub use decision::{Decision, DenialReason};
pub use error::{ConfigError, ConfigResult, ResolveError, ResolveResult};
pub use model::{ContentObject, Identity, IdentityStatus, ObjectId, Status, Surface};
pub use overrides::{CapabilityOverride, FnOverride, OverrideChain, RequireOverride, SharedOverride};
pub use resolver::{Request, Resolver};
pub use store::{
    ForumModerators, MemoryStore, ModeratorLookup, ObjectStore, SharedModeratorLookup, SharedStore,
    allow_forums_of_user, enclosing_forum, is_forum_moderator, moderated_forum_ids,
};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use keygate_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::config::{FeatureFlags, KeygateConfig};
    pub use crate::decision::{Decision, DenialReason};
    pub use crate::error::{ResolveError, ResolveResult};
    pub use crate::model::{ContentObject, Identity, IdentityStatus, ObjectId, Status, Surface};
    pub use crate::overrides::{CapabilityOverride, OverrideChain};
    pub use crate::resolver::{Request, Resolver};
    pub use crate::store::{MemoryStore, ModeratorLookup, ObjectStore};

    pub use keygate_capability::{CapabilitySet, ObjectKind, Role, UserId, standard_ids};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_end_to_end() {
        let store = Arc::new(MemoryStore::with_objects([
            ContentObject::forum(1, 1)
                .with_status(Status::Hidden)
                .with_moderator(UserId::new(3)),
            ContentObject::topic(10, 2, 1),
        ]));
        let resolver = Resolver::new(FeatureFlags::default())
            .with_store(store.clone())
            .with_moderator_lookup(store.clone());

        let forum_moderator = Identity::active(UserId::new(3), Role::Participant.capabilities());
        let bystander = Identity::active(UserId::new(4), Role::Participant.capabilities());
        let topic = store.object(ObjectId::new(10)).unwrap();

        let chain = OverrideChain::new();
        let edit = |identity| {
            resolver.authorize(
                &Request::new(Action::Edit, ObjectKind::Topic, identity).with_object(&topic),
                &chain,
            )
        };

        assert!(edit(&forum_moderator).is_allowed());
        assert!(edit(&bystander).is_denied());
    }
}
