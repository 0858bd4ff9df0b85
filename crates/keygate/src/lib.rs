//! # keygate - Capability Resolution for Forum Content
//!
//! keygate decides whether an identity may perform an action on a forum, a
//! topic or a reply. It narrows meta actions such as "edit this topic" to the
//! primitive capabilities the identity must hold, then checks them.
//!
//! ## Features
//!
//! - **Fail-closed**: inactive identities, missing objects and unknown
//!   actions are denied
//! - **Per-forum moderation**: moderators assigned to a forum moderate its
//!   topics and replies without global moderator rights
//! - **Overrides**: post-resolution hooks tighten or loosen specific answers
//! - **Observability**: decision events and allow/deny metrics
//!
//! ## Quick Start
//!
//! ```
//! use keygate::prelude::*;
//!
//! let store = Arc::new(MemoryStore::with_objects([
//!     ContentObject::forum(1, 1).with_moderator(UserId::new(3)),
//!     ContentObject::topic(10, 2, 1),
//! ]));
//!
//! let gate = Keygate::builder().with_memory_store(store).build();
//! gate.roles().assign(UserId::new(3), Role::Participant);
//!
//! let moderator = gate.identity(UserId::new(3), IdentityStatus::Active);
//! assert!(gate.can(&moderator, Action::Moderate, ObjectKind::Topic, Some(ObjectId::new(10))));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Your Application                     │
//! ├─────────────────────────────────────────────────────────┤
//! │                    keygate (facade)                     │
//! │                  ┌──────────────────┐                   │
//! │                  │  Keygate Builder │                   │
//! │                  └────────┬─────────┘                   │
//! │                           │                             │
//! │  ┌──────────────┬─────────┴──────────┬───────────────┐  │
//! │  │ keygate-core │ keygate-capability │ keygate-      │  │
//! │  │ (resolver,   │ (primitives,       │ observe       │  │
//! │  │  overrides)  │  roles)            │ (events)      │  │
//! │  └──────────────┴────────────────────┴───────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use keygate_capability::{CapabilitySet, ObjectKind, Role, RoleMap, RoleRegistry, UserId};
use keygate_core::{
    Action, CapabilityOverride, ContentObject, Decision, FeatureFlags, Identity, IdentityStatus,
    KeygateConfig, MemoryStore, ModeratorLookup, ObjectId, ObjectStore, OverrideChain, Request,
    ResolveError, ResolveResult, Resolver, Surface,
};
use keygate_observe::{DecisionEvent, DecisionMetrics, DecisionRecord, EventDispatcher, EventSubscriber};

// Re-export from sub-crates
pub use keygate_capability;
pub use keygate_core;
pub use keygate_observe;

/// Main entry point for keygate.
pub struct Keygate;

impl Keygate {
    /// Create a new runtime builder.
    pub fn builder() -> KeygateBuilder {
        KeygateBuilder::new()
    }

    /// Create a runtime with default configuration and no object store.
    pub fn with_defaults() -> KeygateRuntime {
        KeygateBuilder::new().build()
    }
}

/// Builder for configuring the keygate runtime.
pub struct KeygateBuilder {
    config: KeygateConfig,
    store: Option<Arc<dyn ObjectStore>>,
    moderators: Option<Arc<dyn ModeratorLookup>>,
    overrides: OverrideChain,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
    roles: RoleRegistry,
}

impl KeygateBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: KeygateConfig::default(),
            store: None,
            moderators: None,
            overrides: OverrideChain::new(),
            event_subscribers: Vec::new(),
            roles: RoleRegistry::new(),
        }
    }

    // Configuration

    /// Use a full configuration.
    pub fn with_config(mut self, config: KeygateConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, KeygateError> {
        let config = KeygateConfig::load(path)?;
        Ok(self.with_config(config))
    }

    /// Replace the feature flags.
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.config.features = flags;
        self
    }

    // Collaborators

    /// Use an object store to load objects and find enclosing forums.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a moderator lookup for forum moderator sets.
    pub fn with_moderator_lookup(mut self, lookup: Arc<dyn ModeratorLookup>) -> Self {
        self.moderators = Some(lookup);
        self
    }

    /// Use an in-memory store as both object store and moderator lookup.
    pub fn with_memory_store(self, store: Arc<MemoryStore>) -> Self {
        self.with_store(store.clone()).with_moderator_lookup(store)
    }

    /// Use an existing role registry.
    pub fn with_roles(mut self, roles: RoleRegistry) -> Self {
        self.roles = roles;
        self
    }

    // Overrides

    /// Append a post-resolution override.
    pub fn with_override<O: CapabilityOverride + 'static>(mut self, o: O) -> Self {
        self.overrides.push(o);
        self
    }

    // Observability

    /// Add an event subscriber.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Build the runtime.
    pub fn build(self) -> KeygateRuntime {
        let mut resolver = Resolver::new(self.config.features.clone());
        if let Some(store) = &self.store {
            resolver = resolver.with_store(Arc::clone(store));
        }
        if let Some(lookup) = self.moderators {
            resolver = resolver.with_moderator_lookup(lookup);
        }

        let event_dispatcher = EventDispatcher::new();
        for subscriber in self.event_subscribers {
            event_dispatcher.subscribe(subscriber);
        }

        tracing::debug!(
            per_object_moderation = self.config.features.per_object_moderation,
            overrides = ?self.overrides.names(),
            has_store = self.store.is_some(),
            "Keygate runtime built"
        );

        KeygateRuntime {
            role_map: self.config.role_map(),
            resolver,
            store: self.store,
            overrides: self.overrides,
            roles: Arc::new(self.roles),
            event_dispatcher: Arc::new(event_dispatcher),
            metrics: Arc::new(DecisionMetrics::new()),
        }
    }
}

impl Default for KeygateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured keygate runtime.
pub struct KeygateRuntime {
    resolver: Resolver,
    store: Option<Arc<dyn ObjectStore>>,
    overrides: OverrideChain,
    roles: Arc<RoleRegistry>,
    role_map: RoleMap,
    event_dispatcher: Arc<EventDispatcher>,
    metrics: Arc<DecisionMetrics>,
}

impl KeygateRuntime {
    /// Get the resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Get the feature flags.
    pub fn flags(&self) -> &FeatureFlags {
        self.resolver.flags()
    }

    /// Get the override chain.
    pub fn overrides(&self) -> &OverrideChain {
        &self.overrides
    }

    /// Get the role registry.
    pub fn roles(&self) -> &Arc<RoleRegistry> {
        &self.roles
    }

    /// Get the site role map.
    pub fn role_map(&self) -> &RoleMap {
        &self.role_map
    }

    /// Get the event dispatcher.
    pub fn event_dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.event_dispatcher
    }

    /// Get the decision metrics.
    pub fn metrics(&self) -> &Arc<DecisionMetrics> {
        &self.metrics
    }

    /// Give a user the forum role mapped from their site role, if they have
    /// no forum role yet.
    ///
    /// A user with no site role only gets the default role when global
    /// access is enabled. Inactive users never get a role.
    pub fn register_user(
        &self,
        user: UserId,
        site_role: Option<&str>,
        status: IdentityStatus,
    ) -> Option<Role> {
        if site_role.is_none() && !self.flags().global_access {
            return None;
        }
        self.roles.ensure_default_role(
            user,
            site_role,
            &self.role_map,
            status == IdentityStatus::Active,
        )
    }

    /// Snapshot an identity from the role registry.
    pub fn identity(&self, user: UserId, status: IdentityStatus) -> Identity {
        Identity::user(user, status, self.roles.grants_for(user))
    }

    /// Resolve a request and run the override chain.
    pub fn resolve(&self, request: &Request<'_>) -> Result<CapabilitySet, KeygateError> {
        Ok(self.resolve_observed(request)?)
    }

    /// Decide a request.
    ///
    /// Emits events and updates metrics. Resolution errors become denials.
    pub fn check(&self, request: &Request<'_>) -> Decision {
        let decision = match self.resolve_observed(request) {
            Ok(required) => Decision::evaluate(request.identity, required),
            Err(error) => Decision::unresolvable(&error),
        };
        self.observe_decision(request, &decision);
        decision
    }

    /// Get an object snapshot from the store.
    pub fn object(&self, id: ObjectId) -> Option<ContentObject> {
        self.store.as_ref().and_then(|store| store.object(id))
    }

    /// Check an action on an object loaded from the store.
    ///
    /// A missing object, or a missing store, is a denial.
    pub fn can(
        &self,
        identity: &Identity,
        action: Action,
        kind: ObjectKind,
        object: Option<ObjectId>,
    ) -> bool {
        self.record_by_id(identity, action, kind, object, Surface::Front)
            .is_allowed()
    }

    /// Decide an action on an object loaded from the store and produce a
    /// record of it.
    ///
    /// A missing object, or a missing store, is recorded as an
    /// unresolvable denial.
    pub fn record_by_id(
        &self,
        identity: &Identity,
        action: Action,
        kind: ObjectKind,
        object: Option<ObjectId>,
        surface: Surface,
    ) -> DecisionRecord {
        let request = Request::new(action, kind, identity).on_surface(surface);
        let Some(id) = object else {
            return self.record(&request);
        };

        match self.object(id) {
            Some(object) => self.record(&request.with_object(&object)),
            None => {
                let error = ResolveError::ObjectNotFound(id);
                self.observe_failure(action.as_str(), &error);
                let decision = Decision::unresolvable(&error);
                self.observe_decision(&request, &decision);
                DecisionRecord::new(
                    identity.to_string(),
                    action,
                    kind,
                    Some(id),
                    surface,
                    decision,
                )
            }
        }
    }

    /// Decide a request whose action is given by name.
    ///
    /// Unknown action names are denied.
    pub fn check_named(
        &self,
        identity: &Identity,
        action: &str,
        kind: ObjectKind,
        object: Option<&ContentObject>,
    ) -> Decision {
        match action.parse::<Action>() {
            Ok(action) => self.check(&Request::new(action, kind, identity).with_optional_object(object)),
            Err(error) => {
                self.observe_failure(action, &error);
                let decision = Decision::unresolvable(&error);
                self.metrics.record_named_decision(action, &decision);
                self.event_dispatcher.emit(DecisionEvent::named_outcome(
                    identity,
                    action,
                    kind,
                    object.map(|object| object.id),
                    decision.reason().cloned(),
                ));
                decision
            }
        }
    }

    /// Decide a request and produce an auditable record of it.
    pub fn record(&self, request: &Request<'_>) -> DecisionRecord {
        let decision = self.check(request);
        DecisionRecord::new(
            request.identity.to_string(),
            request.action,
            request.kind,
            request.object.map(|object| object.id),
            request.surface,
            decision,
        )
    }

    fn resolve_observed(&self, request: &Request<'_>) -> ResolveResult<CapabilitySet> {
        match self.resolver.resolve_request(request) {
            Ok(resolved) => {
                let required = self.overrides.apply(request, resolved);
                self.metrics.record_requirement(&required);
                self.event_dispatcher.emit(DecisionEvent::Resolved {
                    action: request.action,
                    kind: request.kind,
                    object: request.object.map(|object| object.id),
                    required: required.clone(),
                });
                Ok(required)
            }
            Err(error) => {
                self.observe_failure(request.action.as_str(), &error);
                Err(error)
            }
        }
    }

    fn observe_failure(&self, action: &str, error: &ResolveError) {
        self.metrics.record_error();
        self.event_dispatcher.emit(DecisionEvent::Failed {
            action: action.to_string(),
            message: error.to_string(),
        });
    }

    fn observe_decision(&self, request: &Request<'_>, decision: &Decision) {
        self.metrics.record_decision(request.action, decision);
        self.event_dispatcher.emit(DecisionEvent::outcome(
            request.identity,
            request.action,
            request.kind,
            request.object.map(|object| object.id),
            decision.reason().cloned(),
        ));
    }
}

impl std::fmt::Debug for KeygateRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeygateRuntime")
            .field("resolver", &self.resolver)
            .field("overrides", &self.overrides)
            .field("roles", &self.roles.len())
            .finish()
    }
}

/// Errors from the keygate runtime.
#[derive(Debug, thiserror::Error)]
pub enum KeygateError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] keygate_core::ConfigError),

    /// Resolution error.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Capability error.
    #[error("Capability error: {0}")]
    Capability(#[from] keygate_capability::CapabilityError),
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{Keygate, KeygateBuilder, KeygateError, KeygateRuntime};

    // Core types
    pub use keygate_core::{
        Action, ContentObject, Decision, FeatureFlags, Identity, IdentityStatus, KeygateConfig,
        MemoryStore, ModeratorLookup, ObjectId, ObjectStore, OverrideChain, Request,
        RequireOverride, Resolver, Status, Surface,
    };

    // Capability types
    pub use keygate_capability::{
        CapabilityId, CapabilitySet, ObjectKind, Role, RoleMap, RoleRegistry, UserId, standard_ids,
    };

    // Observability types
    pub use keygate_observe::{
        CollectingSubscriber, DecisionEvent, DecisionMetrics, DecisionRecord, EventDispatcher,
        EventSubscriber, LoggingSubscriber,
    };

    // Common std types
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use keygate_core::{DenialReason, FnOverride};

    /// Forum 1 (private, moderated by user 3) holds topic 10 by user 2, which
    /// holds reply 100 by user 5. Forum 2 is a public sub-forum of forum 1.
    fn fixture() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_objects([
            ContentObject::forum(1, 1)
                .with_status(Status::Private)
                .with_moderator(UserId::new(3)),
            ContentObject::forum(2, 1).with_parent(ObjectId::new(1)),
            ContentObject::topic(10, 2, 1),
            ContentObject::reply(100, 5, 10),
            ContentObject::topic(20, 2, 2),
        ]))
    }

    fn gate() -> KeygateRuntime {
        let gate = Keygate::builder().with_memory_store(fixture()).build();
        gate.roles().assign(UserId::new(1), Role::Keymaster);
        gate.roles().assign(UserId::new(2), Role::Participant);
        gate.roles().assign(UserId::new(3), Role::Participant);
        gate.roles().assign(UserId::new(4), Role::Participant);
        gate.roles().assign(UserId::new(5), Role::Blocked);
        gate
    }

    fn active(gate: &KeygateRuntime, user: u64) -> Identity {
        gate.identity(UserId::new(user), IdentityStatus::Active)
    }

    #[test]
    fn test_forum_moderator_edits_topic_in_their_forum() {
        let gate = gate();
        let topic = Some(ObjectId::new(10));

        assert!(gate.can(&active(&gate, 3), Action::Edit, ObjectKind::Topic, topic));
        assert!(gate.can(&active(&gate, 3), Action::Moderate, ObjectKind::Topic, topic));
        assert!(!gate.can(&active(&gate, 4), Action::Edit, ObjectKind::Topic, topic));
        assert!(!gate.can(&active(&gate, 4), Action::Moderate, ObjectKind::Topic, topic));
    }

    #[test]
    fn test_forum_moderator_does_not_reach_sub_forum() {
        let gate = gate();
        let moderator = active(&gate, 3);

        assert!(!gate.can(&moderator, Action::Moderate, ObjectKind::Forum, Some(ObjectId::new(2))));
        assert!(!gate.can(&moderator, Action::Moderate, ObjectKind::Topic, Some(ObjectId::new(20))));
    }

    #[test]
    fn test_per_object_moderation_can_be_disabled() {
        let gate = Keygate::builder()
            .with_memory_store(fixture())
            .with_flags(FeatureFlags::strict())
            .build();
        gate.roles().assign(UserId::new(3), Role::Participant);

        let moderator = active(&gate, 3);
        assert!(!gate.can(&moderator, Action::Moderate, ObjectKind::Topic, Some(ObjectId::new(10))));
    }

    #[test]
    fn test_owner_reads_own_private_content() {
        let gate = gate();
        // Spectators cannot read private forums, but forum 1 is owned by user 1.
        gate.roles().assign(UserId::new(1), Role::Spectator);

        assert!(gate.can(&active(&gate, 1), Action::Read, ObjectKind::Forum, Some(ObjectId::new(1))));
    }

    #[test]
    fn test_inactive_keymaster_is_denied() {
        let gate = gate();
        let inactive = gate.identity(UserId::new(1), IdentityStatus::Inactive);

        for action in Action::ALL {
            assert!(!gate.can(&inactive, action, ObjectKind::Forum, Some(ObjectId::new(1))));
        }
    }

    #[test]
    fn test_blocked_user_cannot_edit_own_reply() {
        let gate = gate();
        assert!(!gate.can(&active(&gate, 5), Action::Edit, ObjectKind::Reply, Some(ObjectId::new(100))));
    }

    #[test]
    fn test_missing_object_fails_closed() {
        let gate = gate();
        let keymaster = active(&gate, 1);

        assert!(!gate.can(&keymaster, Action::Delete, ObjectKind::Topic, Some(ObjectId::new(999))));
        assert_eq!(gate.metrics().snapshot().requirements.resolution_errors, 1);

        // No store at all.
        let bare = Keygate::with_defaults();
        assert!(!bare.can(&keymaster, Action::Read, ObjectKind::Forum, Some(ObjectId::new(1))));
    }

    #[test]
    fn test_check_named() {
        let gate = gate();
        let keymaster = active(&gate, 1);

        assert!(gate.check_named(&keymaster, "administer", ObjectKind::Forum, None).is_allowed());

        let decision = gate.check_named(&keymaster, "do_anything", ObjectKind::Forum, None);
        assert!(decision.required().is_deny());
        assert!(matches!(decision.reason(), Some(DenialReason::Unresolvable(_))));
    }

    #[test]
    fn test_unknown_action_counts_as_denial() {
        let collector = Arc::new(CollectingSubscriber::new(100));
        let gate = Keygate::builder()
            .with_memory_store(fixture())
            .with_event_subscriber(collector.clone())
            .build();
        let keymaster = active(&gate, 1);

        gate.check_named(&keymaster, "do_anything", ObjectKind::Forum, None);
        gate.can(&keymaster, Action::Read, ObjectKind::Forum, Some(ObjectId::new(999)));

        assert_eq!(collector.event_types(), vec!["failed", "denied", "failed", "denied"]);

        let snapshot = gate.metrics().snapshot();
        assert_eq!(snapshot.actions["do_anything"].denied, 1);
        assert_eq!(snapshot.total.denied, 2);
        assert_eq!(snapshot.denials.unresolvable, 2);
        assert_eq!(snapshot.requirements.resolution_errors, 2);
    }

    #[test]
    fn test_admin_surface_skips_self_edit() {
        let gate = gate();
        let author = active(&gate, 2);
        let topic = ContentObject::topic(10, 2, 1);

        let front = Request::new(Action::Edit, ObjectKind::Topic, &author).with_object(&topic);
        assert!(gate.check(&front).is_allowed());
        assert!(gate.check(&front.on_surface(Surface::Admin)).is_denied());
    }

    #[test]
    fn test_overrides_run_after_resolution() {
        let gate = Keygate::builder()
            .with_memory_store(fixture())
            .with_override(
                RequireOverride::new(Action::Publish, standard_ids::KEEP_GATE)
                    .for_kind(ObjectKind::Forum),
            )
            .with_override(FnOverride::new("read-only", |request: &Request<'_>, set| {
                if request.action == Action::Participate {
                    CapabilitySet::new()
                } else {
                    set
                }
            }))
            .build();
        gate.roles().assign(UserId::new(2), Role::Moderator);
        let moderator = active(&gate, 2);

        assert!(!gate.can(&moderator, Action::Publish, ObjectKind::Forum, None));
        assert!(gate.can(&moderator, Action::Publish, ObjectKind::Topic, None));
        // An emptied requirement is a denial.
        assert!(!gate.can(&moderator, Action::Participate, ObjectKind::Topic, None));
    }

    #[test]
    fn test_events_and_metrics() {
        let collector = Arc::new(CollectingSubscriber::new(100));
        let gate = Keygate::builder()
            .with_memory_store(fixture())
            .with_event_subscriber(collector.clone())
            .build();
        let guest = Identity::guest_with(CapabilitySet::single(standard_ids::SPECTATE));

        gate.can(&guest, Action::Spectate, ObjectKind::Forum, None);
        gate.can(&guest, Action::Delete, ObjectKind::Forum, None);

        assert_eq!(
            collector.event_types(),
            vec!["resolved", "allowed", "failed", "denied"]
        );

        let snapshot = gate.metrics().snapshot();
        assert_eq!(snapshot.action(Action::Spectate).allowed, 1);
        assert_eq!(snapshot.action(Action::Delete).denied, 1);
    }

    #[test]
    fn test_register_user() {
        let gate = Keygate::builder()
            .with_config(KeygateConfig::parse("[roles]\neditor = \"moderator\"\n").unwrap())
            .build();

        assert_eq!(
            gate.register_user(UserId::new(1), Some("administrator"), IdentityStatus::Active),
            Some(Role::Keymaster)
        );
        assert_eq!(
            gate.register_user(UserId::new(2), Some("editor"), IdentityStatus::Active),
            Some(Role::Moderator)
        );
        assert_eq!(
            gate.register_user(UserId::new(3), None, IdentityStatus::Active),
            Some(Role::Participant)
        );
        assert_eq!(
            gate.register_user(UserId::new(4), Some("subscriber"), IdentityStatus::Inactive),
            None
        );
        // Already has a role.
        assert_eq!(
            gate.register_user(UserId::new(1), Some("subscriber"), IdentityStatus::Active),
            None
        );

        let local_only = Keygate::builder()
            .with_flags(FeatureFlags::default().with_global_access(false))
            .build();
        assert_eq!(
            local_only.register_user(UserId::new(5), None, IdentityStatus::Active),
            None
        );
    }

    #[test]
    fn test_record() {
        let gate = gate();
        let author = active(&gate, 2);
        let topic = ContentObject::topic(10, 2, 1);

        let request = Request::new(Action::Edit, ObjectKind::Topic, &author).with_object(&topic);
        let record = gate.record(&request);
        assert!(record.is_allowed());
        assert_eq!(record.identity, "user:2");
        assert_eq!(record.object, Some(ObjectId::new(10)));
    }

    #[test]
    fn test_record_by_id() {
        let gate = gate();
        let author = active(&gate, 2);
        let id = Some(ObjectId::new(10));

        let front = gate.record_by_id(&author, Action::Edit, ObjectKind::Topic, id, Surface::Front);
        assert!(front.is_allowed());
        let admin = gate.record_by_id(&author, Action::Edit, ObjectKind::Topic, id, Surface::Admin);
        assert!(!admin.is_allowed());
        assert_eq!(admin.surface, Surface::Admin);

        let missing = ObjectId::new(999);
        let record =
            gate.record_by_id(&author, Action::Read, ObjectKind::Topic, Some(missing), Surface::Front);
        assert_eq!(record.object, Some(missing));
        assert!(record.decision.required().is_deny());
        assert!(matches!(
            record.decision.reason(),
            Some(DenialReason::Unresolvable(_))
        ));
        assert_eq!(gate.metrics().snapshot().denials.unresolvable, 1);
    }
}
