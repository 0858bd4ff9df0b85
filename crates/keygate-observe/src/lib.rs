//! keygate Observability
//!
//! This crate provides observability features for keygate decisions,
//! including:
//!
//! - [`DecisionMetrics`]: per-action allow/deny counters
//! - [`DecisionRecord`]: auditable records of single decisions
//! - [`EventDispatcher`]: observable event system
//!
//! # Metrics Collection
//!
//! ```
//! use keygate_core::{Action, Decision, DenialReason};
//! use keygate_capability::CapabilitySet;
//! use keygate_observe::DecisionMetrics;
//!
//! let metrics = DecisionMetrics::new();
//! metrics.record_decision(
//!     Action::Read,
//!     &Decision::Denied {
//!         required: CapabilitySet::deny(),
//!         reason: DenialReason::InactiveIdentity,
//!     },
//! );
//!
//! assert_eq!(metrics.snapshot().action(Action::Read).denied, 1);
//! ```
//!
//! # Event Subscription
//!
//! ```ignore
//! use keygate_observe::{EventDispatcher, LoggingSubscriber};
//! use std::sync::Arc;
//!
//! let dispatcher = EventDispatcher::new();
//! dispatcher.subscribe(Arc::new(LoggingSubscriber::new()));
//! ```

pub mod events;
pub mod metrics;
pub mod report;

// Re-export main types
pub use events::{
    CollectingSubscriber, DecisionEvent, EventDispatcher, EventSubscriber, LoggingSubscriber,
};
pub use metrics::{ActionCounts, DecisionMetrics, DenialMetrics, MetricsSnapshot, RequirementMetrics};
pub use report::{DecisionId, DecisionRecord};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{DecisionEvent, EventDispatcher, EventSubscriber};
    pub use crate::metrics::{DecisionMetrics, MetricsSnapshot};
    pub use crate::report::DecisionRecord;
}
