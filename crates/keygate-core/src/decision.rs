//! Final allow/deny decisions.
//!
//! A decision pairs the resolved requirement with the outcome of checking it
//! against the identity's grants. The [`DenialReason`] is for logs and
//! metrics only; user-facing code should show the same denial whatever the
//! reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use keygate_capability::CapabilitySet;

use crate::error::ResolveError;
use crate::model::Identity;
use crate::overrides::OverrideChain;
use crate::resolver::{Request, Resolver};

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    /// The identity is marked as spam or deleted.
    InactiveIdentity,
    /// The requirement resolved to `do_not_allow`.
    UniversalDeny,
    /// The identity holds none of the required primitives.
    MissingCapability,
    /// The request could not be resolved.
    Unresolvable(String),
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::InactiveIdentity => f.write_str("identity is inactive"),
            DenialReason::UniversalDeny => f.write_str("action is never allowed"),
            DenialReason::MissingCapability => f.write_str("missing required capability"),
            DenialReason::Unresolvable(message) => write!(f, "unresolvable request: {}", message),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The identity holds a required primitive.
    Allowed {
        /// The requirement that was satisfied.
        required: CapabilitySet,
    },
    /// The identity may not perform the action.
    Denied {
        /// The requirement that was not satisfied.
        required: CapabilitySet,
        /// Internal reason.
        reason: DenialReason,
    },
}

impl Decision {
    /// Decide a resolved requirement for an identity.
    pub fn evaluate(identity: &Identity, required: CapabilitySet) -> Self {
        if identity.is_inactive() {
            return Decision::Denied {
                required,
                reason: DenialReason::InactiveIdentity,
            };
        }
        if required.is_deny() {
            return Decision::Denied {
                required,
                reason: DenialReason::UniversalDeny,
            };
        }
        if identity.satisfies(&required) {
            Decision::Allowed { required }
        } else {
            Decision::Denied {
                required,
                reason: DenialReason::MissingCapability,
            }
        }
    }

    /// The fail-closed decision for an unresolvable request.
    pub fn unresolvable(error: &ResolveError) -> Self {
        Decision::Denied {
            required: error.fallback(),
            reason: DenialReason::Unresolvable(error.to_string()),
        }
    }

    /// Check if the decision allows the action.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Check if the decision denies the action.
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Get the resolved requirement.
    pub fn required(&self) -> &CapabilitySet {
        match self {
            Decision::Allowed { required } | Decision::Denied { required, .. } => required,
        }
    }

    /// Get the denial reason, if denied.
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            Decision::Allowed { .. } => None,
            Decision::Denied { reason, .. } => Some(reason),
        }
    }
}

impl Resolver {
    /// Resolve a request, run the override chain and decide it.
    ///
    /// Resolution errors become denials.
    pub fn authorize(&self, request: &Request<'_>, overrides: &OverrideChain) -> Decision {
        match self.resolve_request(request) {
            Ok(resolved) => Decision::evaluate(request.identity, overrides.apply(request, resolved)),
            Err(error) => Decision::unresolvable(&error),
        }
    }
}
