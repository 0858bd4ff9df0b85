//! Check command - Decide whether an identity may perform an action.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use keygate::prelude::*;

use super::{RequestArgs, Session};
use crate::OutputFormat;

/// Output for an action name that does not exist.
#[derive(Debug, Serialize)]
struct UnknownActionResult {
    identity: String,
    action: String,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Execute the check command.
///
/// Returns whether the request was allowed. Unknown actions and missing
/// objects are denials, not errors.
pub fn execute(args: RequestArgs, config: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let (session, _) = Session::open(&args, config)?;

    let Ok(action) = args.action.parse::<Action>() else {
        let decision = session.gate.check_named(
            &session.identity,
            &args.action,
            args.kind,
            session.object.as_ref(),
        );
        let result = UnknownActionResult {
            identity: session.identity.to_string(),
            action: args.action.clone(),
            allowed: decision.is_allowed(),
            reason: decision.reason().map(ToString::to_string),
        };
        match format {
            OutputFormat::Human => match &result.reason {
                Some(reason) => println!("Outcome: denied ({})", reason),
                None => println!("Outcome: allowed"),
            },
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&result)?),
        }
        return Ok(result.allowed);
    };

    let record = session.gate.record_by_id(
        &session.identity,
        action,
        args.kind,
        args.object.map(ObjectId::new),
        args.surface(),
    );

    match format {
        OutputFormat::Human => print!("{}", record.to_text()),
        OutputFormat::Json => println!("{}", record.to_json_pretty()),
        OutputFormat::JsonCompact => println!("{}", record.to_json()),
    }

    Ok(record.is_allowed())
}
