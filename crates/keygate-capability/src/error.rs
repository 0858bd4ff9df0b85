//! Error types for capabilities and roles.

use thiserror::Error;

use crate::user::UserId;

/// Errors related to capabilities and role assignment.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A role name did not match any forum role.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A content kind name did not match any known kind.
    #[error("Unknown content kind: {0}")]
    UnknownKind(String),

    /// A capability name is malformed.
    #[error("Invalid capability name: '{0}'")]
    InvalidName(String),

    /// The user has no forum role.
    #[error("User {0} has no forum role")]
    NoRole(UserId),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;
