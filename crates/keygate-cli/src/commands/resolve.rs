//! Resolve command - Show the primitives an action requires.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;

use keygate::prelude::*;

use super::{RequestArgs, Session};
use crate::OutputFormat;

/// Resolution result.
#[derive(Debug, Serialize)]
struct ResolveOutput {
    identity: String,
    action: Action,
    kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    object: Option<ObjectId>,
    surface: Surface,
    required: CapabilitySet,
}

/// Execute the resolve command.
pub fn execute(args: RequestArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let action: Action = args.action.parse()?;
    let (session, missing) = Session::open(&args, config)?;
    if let Some(id) = missing {
        bail!("Object {} is not in the fixture", id);
    }

    let request = Request::new(action, args.kind, &session.identity)
        .with_optional_object(session.object.as_ref())
        .on_surface(args.surface());
    let required = session.gate.resolve(&request)?;

    let result = ResolveOutput {
        identity: session.identity.to_string(),
        action,
        kind: args.kind,
        object: session.object.as_ref().map(|object| object.id),
        surface: args.surface(),
        required,
    };

    match format {
        OutputFormat::Human => {
            print!("{} {} {}", result.identity, result.action, result.kind);
            if let Some(object) = result.object {
                print!(" #{}", object);
            }
            if args.admin {
                print!(" (admin)");
            }
            println!();
            println!("Requires: {}", result.required);
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
