//! Roles command - Show the primitives each forum role holds.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use keygate::prelude::*;

use super::load_config;
use crate::OutputFormat;

/// Arguments for the roles command.
#[derive(Args)]
pub struct RolesArgs {
    /// Only show this role
    #[arg(short, long)]
    pub role: Option<Role>,
}

/// Roles table.
#[derive(Debug, Serialize)]
struct RolesResult {
    default_role: Role,
    roles: Vec<RoleDisplay>,
}

#[derive(Debug, Serialize)]
struct RoleDisplay {
    role: Role,
    capabilities: CapabilitySet,
}

/// Execute the roles command.
pub fn execute(args: RolesArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config)?;

    let result = RolesResult {
        default_role: config.features.default_role,
        roles: Role::ALL
            .into_iter()
            .filter(|role| args.role.is_none_or(|only| only == *role))
            .map(|role| RoleDisplay {
                role,
                capabilities: role.capabilities(),
            })
            .collect(),
    };

    match format {
        OutputFormat::Human => {
            println!("Default role: {}", result.default_role);
            for entry in &result.roles {
                println!();
                println!("{} ({}):", entry.role, entry.capabilities.len());
                if entry.capabilities.is_empty() {
                    println!("  (none)");
                }
                for id in &entry.capabilities {
                    println!("  {}", id);
                }
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
