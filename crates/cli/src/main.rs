//! API tester CLI - database migrations and credential import.
//!
//! # Usage
//!
//! ```bash
//! # Run API tester database migrations
//! api-tester-cli migrate api-tester
//!
//! # Run theme modifier database migrations
//! api-tester-cli migrate theme-modifier
//!
//! # Run all database migrations
//! api-tester-cli migrate all
//!
//! # Show the sessions a theme modifier database holds
//! api-tester-cli import --list
//!
//! # Import them from another app's database
//! api-tester-cli import --source ../my-app/theme-modifier.sqlite --app-name my-app
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "api-tester-cli")]
#[command(author, version, about = "API tester and theme modifier CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Import OAuth sessions from a theme modifier database as credentials
    Import {
        /// Source `SQLite` file (default: `SYNC_SOURCE_DATABASE`)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Credential name to store under (default: the source's app directory,
        /// else `SYNC_APP_NAME`)
        #[arg(long)]
        app_name: Option<String>,

        /// Show what would be imported without writing
        #[arg(long)]
        dry_run: bool,

        /// Only list the sessions found in the source
        #[arg(long, conflicts_with = "dry_run")]
        list: bool,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run API tester (credential store) migrations
    ApiTester,
    /// Run theme modifier (`Session` table) migrations
    ThemeModifier,
    /// Run all database migrations
    All,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::ApiTester => commands::migrate::api_tester().await?,
            MigrateTarget::ThemeModifier => commands::migrate::theme_modifier().await?,
            MigrateTarget::All => {
                commands::migrate::api_tester().await?;
                commands::migrate::theme_modifier().await?;
            }
        },
        Commands::Import {
            source,
            app_name,
            dry_run,
            list,
        } => {
            let mode = if list {
                commands::import::Mode::List
            } else if dry_run {
                commands::import::Mode::DryRun
            } else {
                commands::import::Mode::Import
            };
            commands::import::run(source, app_name, mode).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_conflicts_with_dry_run() {
        let parsed = Cli::try_parse_from(["api-tester-cli", "import", "--list", "--dry-run"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_migrate_targets_are_kebab_case() {
        assert!(Cli::try_parse_from(["api-tester-cli", "migrate", "theme-modifier"]).is_ok());
        assert!(Cli::try_parse_from(["api-tester-cli", "migrate", "api-tester"]).is_ok());
    }
}
