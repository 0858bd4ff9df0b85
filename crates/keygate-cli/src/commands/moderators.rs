//! Moderators command - List the forums a user moderates.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use keygate::prelude::*;

use super::load_config;
use crate::OutputFormat;
use crate::fixture::Fixture;

/// Arguments for the moderators command.
#[derive(Args)]
pub struct ModeratorsArgs {
    /// Fixture file describing users and content
    #[arg(long, required = true)]
    pub fixture: PathBuf,

    /// User ID
    #[arg(short, long)]
    pub user: u64,
}

/// Moderated forums.
#[derive(Debug, Serialize)]
struct ModeratorsResult {
    user: UserId,
    per_object_moderation: bool,
    forums: Vec<ObjectId>,
    /// Non-public forums that stay out of this user's listings.
    excluded: Vec<ObjectId>,
}

/// Execute the moderators command.
pub fn execute(args: ModeratorsArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config)?;
    let fixture = Fixture::load(&args.fixture)?;
    let user = UserId::new(args.user);
    let per_object_moderation = config.features.per_object_moderation;
    let gate = fixture.runtime(config);
    let resolver = gate.resolver();

    let non_public: Vec<ObjectId> = fixture
        .objects
        .iter()
        .filter(|object| object.kind == ObjectKind::Forum && object.status != Status::Public)
        .map(|object| object.id)
        .collect();

    let result = ModeratorsResult {
        user,
        per_object_moderation,
        forums: resolver.moderated_forums(user),
        excluded: resolver.allow_forums_of_user(&non_public, user),
    };

    match format {
        OutputFormat::Human => {
            if !result.per_object_moderation {
                println!("Per-forum moderation is disabled; assignments are ignored.");
            }
            if result.forums.is_empty() {
                println!("User {} moderates no forums", result.user);
            } else {
                println!("User {} moderates {} forum(s):", result.user, result.forums.len());
                for forum in &result.forums {
                    println!("  #{}", forum);
                }
            }
            if !result.excluded.is_empty() {
                let ids: Vec<String> = result.excluded.iter().map(ToString::to_string).collect();
                println!("Non-public forums still excluded: {}", ids.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
