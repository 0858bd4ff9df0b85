//! Core error types for keygate.
//!
//! Resolution errors are never surfaced to end users. Every caller turns them
//! into a denial, and [`ResolveError::fallback`] gives the capability set to
//! use when a set is needed anyway.

use std::path::PathBuf;

use thiserror::Error;

use keygate_capability::{CapabilitySet, ObjectKind};

use crate::action::Action;
use crate::model::ObjectId;

/// Errors that make a request unresolvable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A per-object action was requested without an object.
    #[error("Action '{action}' requires a target object")]
    MissingObject {
        /// The action that was requested.
        action: Action,
    },

    /// The action name is not part of the action set.
    #[error("Unknown action: '{0}'")]
    UnknownAction(String),

    /// The object is not of the kind the request names.
    #[error("Kind mismatch: request targets {expected}, object is a {actual}")]
    KindMismatch {
        /// Kind named by the request.
        expected: ObjectKind,
        /// Kind of the supplied object.
        actual: ObjectKind,
    },

    /// The target object could not be loaded.
    #[error("Object {0} not found")]
    ObjectNotFound(ObjectId),
}

impl ResolveError {
    /// The fail-closed capability set for an unresolvable request.
    pub fn fallback(&self) -> CapabilitySet {
        CapabilitySet::deny()
    }
}

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
