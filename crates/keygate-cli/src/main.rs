//! keygate CLI - Command-line interface for keygate capability resolution.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod fixture;

/// Exit code for a request that was decided and denied.
const EXIT_DENIED: u8 = 2;

/// keygate capability resolver
#[derive(Parser)]
#[command(name = "keygate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Output format options.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the primitives an action requires
    Resolve(commands::RequestArgs),
    /// Decide whether an identity may perform an action
    Check(commands::RequestArgs),
    /// Show the primitives each forum role holds
    Roles(commands::roles::RolesArgs),
    /// List the forums a user moderates
    Moderators(commands::moderators::ModeratorsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keygate={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Resolve(args) => {
            commands::resolve::execute(args, config, cli.format).map(|()| ExitCode::SUCCESS)
        }
        Commands::Check(args) => commands::check::execute(args, config, cli.format).map(|allowed| {
            if allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_DENIED)
            }
        }),
        Commands::Roles(args) => {
            commands::roles::execute(args, config, cli.format).map(|()| ExitCode::SUCCESS)
        }
        Commands::Moderators(args) => {
            commands::moderators::execute(args, config, cli.format).map(|()| ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "keygate", "check", "--fixture", "forum.toml", "--action", "edit", "--kind", "topic",
            "--user", "3", "--object", "10", "--admin", "-f", "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, OutputFormat::Json));
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.action, "edit");
                assert_eq!(args.user, Some(3));
                assert_eq!(args.object, Some(10));
                assert!(args.admin);
            }
            _ => panic!("Wrong command"),
        }
    }
}
