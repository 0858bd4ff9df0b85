//! keygate Capability System
//!
//! This crate defines the vocabulary of forum authorization:
//!
//! - [`CapabilityId`]: a primitive capability name such as `edit_forums`
//! - [`ObjectKind`] and [`KindCapabilities`]: the per-kind primitive namespaces
//! - [`CapabilitySet`]: what an action requires, or what a user holds
//! - [`Role`] and [`RoleMap`]: forum roles and how site roles map onto them
//! - [`RoleRegistry`]: concurrent user → role assignment
//!
//! Deciding *which* primitives an action needs is the job of the resolver in
//! `keygate-core`; this crate only names them and hands them out.
//!
//! # Usage
//!
//! ```
//! use keygate_capability::{CapabilitySet, Role, RoleRegistry, UserId, standard_ids};
//!
//! let registry = RoleRegistry::new();
//! registry.assign(UserId::new(1), Role::Moderator);
//!
//! let required = CapabilitySet::single(standard_ids::MODERATE);
//! assert!(required.satisfied_by(&registry.grants_for(UserId::new(1))));
//! ```

pub mod capability;
pub mod error;
pub mod registry;
pub mod role;
pub mod set;
pub mod user;

// Re-export main types
pub use capability::{CapabilityId, KindCapabilities, ObjectKind, standard_ids};
pub use error::{CapabilityError, CapabilityResult};
pub use registry::RoleRegistry;
pub use role::{Role, RoleMap};
pub use set::CapabilitySet;
pub use user::UserId;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capability::{CapabilityId, ObjectKind, standard_ids};
    pub use crate::error::{CapabilityError, CapabilityResult};
    pub use crate::registry::RoleRegistry;
    pub use crate::role::{Role, RoleMap};
    pub use crate::set::CapabilitySet;
    pub use crate::user::UserId;
}
