//! Command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use keygate::prelude::*;

use crate::fixture::Fixture;

pub mod check;
pub mod moderators;
pub mod resolve;
pub mod roles;

/// Arguments shared by `resolve` and `check`.
#[derive(Args)]
pub struct RequestArgs {
    /// Fixture file describing users and content
    #[arg(long, required = true)]
    pub fixture: PathBuf,

    /// Action name (read, edit, moderate, ...)
    #[arg(short, long)]
    pub action: String,

    /// Content kind
    #[arg(short, long, default_value = "forum")]
    pub kind: ObjectKind,

    /// User ID (omit for a guest)
    #[arg(short, long)]
    pub user: Option<u64>,

    /// Target object ID
    #[arg(short, long)]
    pub object: Option<u64>,

    /// Ask from the administrative surface
    #[arg(long)]
    pub admin: bool,
}

impl RequestArgs {
    /// Get the surface the request comes from.
    pub fn surface(&self) -> Surface {
        if self.admin { Surface::Admin } else { Surface::Front }
    }
}

/// Load the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<KeygateConfig> {
    match path {
        Some(path) => KeygateConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(KeygateConfig::default()),
    }
}

/// Everything a request-shaped command needs.
pub struct Session {
    /// The configured runtime.
    pub gate: KeygateRuntime,
    /// The identity asking.
    pub identity: Identity,
    /// The target object, if one was named and found.
    pub object: Option<ContentObject>,
}

impl Session {
    /// Load the config and fixture, then look up the user and object.
    ///
    /// The object is read from the runtime's store. A named object that the
    /// store does not contain is left as `None` and reported through
    /// `missing`.
    pub fn open(args: &RequestArgs, config: Option<&Path>) -> Result<(Self, Option<ObjectId>)> {
        let config = load_config(config)?;
        let fixture = Fixture::load(&args.fixture)?;
        let gate = fixture.runtime(config);
        let identity = fixture.identity(&gate, args.user)?;

        let requested = args.object.map(ObjectId::new);
        let object = requested.and_then(|id| gate.object(id));
        let missing = requested.filter(|_| object.is_none());

        Ok((
            Self {
                gate,
                identity,
                object,
            },
            missing,
        ))
    }
}
