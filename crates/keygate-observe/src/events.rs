//! Observable events emitted while authorizing requests.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use keygate_capability::{CapabilitySet, ObjectKind};
use keygate_core::{Action, DenialReason, Identity, ObjectId};

/// Events that can be observed while authorizing requests.
#[derive(Debug, Clone)]
pub enum DecisionEvent {
    /// A requirement was resolved.
    Resolved {
        /// The meta action.
        action: Action,
        /// The content kind.
        kind: ObjectKind,
        /// Target object, if any.
        object: Option<ObjectId>,
        /// The resolved requirement.
        required: CapabilitySet,
    },
    /// A request was allowed.
    Allowed {
        /// Who asked, rendered for logs.
        identity: String,
        /// The action name as requested.
        action: String,
        /// The content kind.
        kind: ObjectKind,
        /// Target object, if any.
        object: Option<ObjectId>,
    },
    /// A request was denied.
    Denied {
        /// Who asked, rendered for logs.
        identity: String,
        /// The action name as requested.
        action: String,
        /// The content kind.
        kind: ObjectKind,
        /// Target object, if any.
        object: Option<ObjectId>,
        /// Internal reason.
        reason: DenialReason,
    },
    /// A request could not be resolved.
    Failed {
        /// The action name as requested.
        action: String,
        /// Error message.
        message: String,
    },
    /// Custom event.
    Custom {
        /// Event name.
        name: String,
        /// Event data.
        data: serde_json::Value,
    },
}

impl DecisionEvent {
    /// Create an allowed or denied event for an identity.
    pub fn outcome(
        identity: &Identity,
        action: Action,
        kind: ObjectKind,
        object: Option<ObjectId>,
        reason: Option<DenialReason>,
    ) -> Self {
        Self::named_outcome(identity, action.as_str(), kind, object, reason)
    }

    /// Create an allowed or denied event for an action given by name.
    ///
    /// Used for names that do not parse to an [`Action`].
    pub fn named_outcome(
        identity: &Identity,
        action: &str,
        kind: ObjectKind,
        object: Option<ObjectId>,
        reason: Option<DenialReason>,
    ) -> Self {
        let identity = identity.to_string();
        let action = action.to_string();
        match reason {
            None => DecisionEvent::Allowed {
                identity,
                action,
                kind,
                object,
            },
            Some(reason) => DecisionEvent::Denied {
                identity,
                action,
                kind,
                object,
                reason,
            },
        }
    }

    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            DecisionEvent::Resolved { .. } => "resolved",
            DecisionEvent::Allowed { .. } => "allowed",
            DecisionEvent::Denied { .. } => "denied",
            DecisionEvent::Failed { .. } => "failed",
            DecisionEvent::Custom { .. } => "custom",
        }
    }
}

/// Subscriber for decision events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &DecisionEvent);

    /// Filter for event types this subscriber is interested in.
    /// Returns `None` to receive all events.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None
    }
}

/// A subscriber that logs events through `tracing`.
///
/// Denials and failures are logged at `warn`; everything else is `debug` or
/// `trace`.
#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &DecisionEvent) {
        match event {
            DecisionEvent::Resolved {
                action,
                kind,
                object,
                required,
            } => {
                tracing::trace!(
                    event = "resolved",
                    action = %action,
                    kind = %kind,
                    object = ?object.map(|id| id.get()),
                    required = %required,
                    "Requirement resolved"
                );
            }
            DecisionEvent::Allowed {
                identity,
                action,
                kind,
                object,
            } => {
                tracing::debug!(
                    event = "allowed",
                    identity = identity,
                    action = %action,
                    kind = %kind,
                    object = ?object.map(|id| id.get()),
                    "Request allowed"
                );
            }
            DecisionEvent::Denied {
                identity,
                action,
                kind,
                object,
                reason,
            } => {
                tracing::warn!(
                    event = "denied",
                    identity = identity,
                    action = %action,
                    kind = %kind,
                    object = ?object.map(|id| id.get()),
                    reason = %reason,
                    "Request denied"
                );
            }
            DecisionEvent::Failed { action, message } => {
                tracing::warn!(
                    event = "failed",
                    action = action,
                    message = message,
                    "Request could not be resolved"
                );
            }
            DecisionEvent::Custom { name, data } => {
                tracing::debug!(event = "custom", name = name, data = %data, "Custom event");
            }
        }
    }
}

/// A subscriber that collects events for later analysis.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(Instant, DecisionEvent)>>,
    max_events: usize,
    filter: Option<Vec<&'static str>>,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber that keeps at most `max_events`.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
            filter: None,
        }
    }

    /// Only collect the given event types.
    pub fn only(mut self, event_types: Vec<&'static str>) -> Self {
        self.filter = Some(event_types);
        self
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(Instant, DecisionEvent)> {
        self.events.read().clone()
    }

    /// Get the type names of collected events, in order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .iter()
            .map(|(_, event)| event.event_type())
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &DecisionEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }

    fn event_filter(&self) -> Option<Vec<&'static str>> {
        self.filter.clone()
    }
}

impl std::fmt::Debug for CollectingSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectingSubscriber")
            .field("events", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}

/// Event dispatcher that manages subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Emit an event to all interested subscribers.
    pub fn emit(&self, event: DecisionEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
