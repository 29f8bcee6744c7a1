//! Import OAuth sessions from a theme modifier database.
//!
//! Same flow as `POST /api/sync-token`, with a choice of source file and
//! credential name, plus `--list` and `--dry-run` previews.
//!
//! # Environment Variables
//!
//! - `API_TESTER_DATABASE_URL` - credential store written to
//! - `SYNC_SOURCE_DATABASE` - default `--source`
//! - `SYNC_APP_NAME` - default `--app-name` when `--source` names no app
//!   directory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use api_tester::config::ApiTesterConfig;
use api_tester::db::StoreCredentialRepository;
use api_tester::services::sync::{
    SessionSource, SqliteSessionSource, SyncError, SyncReport, SyncStatus, sync_sessions,
};
use api_tester_core::{SourceSession, preferred_sessions};
use secrecy::ExposeSecret;
use thiserror::Error;

const TOKEN_PREVIEW_CHARS: usize = 12;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Config(#[from] api_tester::config::ConfigError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the sessions found.
    List,
    /// Print the sessions found and the credentials that would be written.
    DryRun,
    /// Upsert one credential per shop.
    Import,
}

/// Sessions already read from the source, so the import doesn't open the
/// file a second time.
struct Loaded(Vec<SourceSession>);

impl SessionSource for Loaded {
    async fn load_sessions(&self) -> Result<Vec<SourceSession>, SyncError> {
        Ok(self.0.clone())
    }
}

/// Run the import.
///
/// # Errors
///
/// Returns `ImportError::Sync` if the source is missing or unreadable, or a
/// database error if the credential store can't be written.
#[allow(clippy::print_stdout)]
pub async fn run(
    source: Option<PathBuf>,
    app_name: Option<String>,
    mode: Mode,
) -> Result<(), ImportError> {
    let config = ApiTesterConfig::from_env()?;
    let app_name = app_name
        .or_else(|| source.as_deref().and_then(app_name_from_source))
        .unwrap_or(config.sync.app_name);
    let source = SqliteSessionSource::new(source.unwrap_or(config.sync.source_database));

    println!("=== Shopify Credentials Import ===\n");
    println!("Source: {}", source.path().display());
    println!("App Name: {app_name}");
    if mode == Mode::DryRun {
        println!("Mode: DRY RUN (no changes will be made)");
    }
    println!();

    let sessions = source.load_sessions().await?;
    if sessions.is_empty() {
        println!("No sessions with access tokens found in source database.");
        return Ok(());
    }

    println!("Found {} session(s) with access tokens:\n", sessions.len());
    for line in describe_sessions(&sessions) {
        println!("{line}");
    }
    println!();

    match mode {
        Mode::List => {}
        Mode::DryRun => {
            println!("DRY RUN: Would import the following credentials:");
            for line in planned_imports(&sessions, &app_name) {
                println!("{line}");
            }
        }
        Mode::Import => {
            let pool = api_tester::db::create_pool(&config.database_url).await?;
            api_tester::db::run_migrations(&pool).await?;

            let repo = StoreCredentialRepository::new(&pool);
            let report = sync_sessions(&repo, &Loaded(sessions), &app_name).await?;
            pool.close().await;

            for line in report_lines(&report, &app_name) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Name of the app directory holding an explicit `--source` file, skipping
/// a `prisma/` or `data/` folder.
fn app_name_from_source(source: &Path) -> Option<String> {
    let mut dir = source.parent()?;
    if matches!(
        dir.file_name().and_then(|n| n.to_str()),
        Some("prisma" | "data")
    ) {
        dir = dir.parent()?;
    }
    dir.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_owned)
}

/// First characters of a token, enough to tell tokens apart.
fn token_preview(token: &str) -> String {
    let preview: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{preview}...")
}

/// Sessions grouped by shop, one line per session.
fn describe_sessions(sessions: &[SourceSession]) -> Vec<String> {
    let mut by_shop: BTreeMap<&str, Vec<&SourceSession>> = BTreeMap::new();
    for session in sessions {
        by_shop.entry(session.shop.as_str()).or_default().push(session);
    }

    let mut lines = Vec::new();
    for (shop, shop_sessions) in by_shop {
        lines.push(format!("  Store: {shop}"));
        for session in shop_sessions {
            lines.push(format!(
                "    - {} session: {} (scopes: {})",
                session.kind(),
                token_preview(session.access_token.expose_secret()),
                session.scope.as_deref().unwrap_or("N/A"),
            ));
        }
    }
    lines
}

fn planned_imports(sessions: &[SourceSession], app_name: &str) -> Vec<String> {
    preferred_sessions(sessions)
        .into_iter()
        .map(|session| {
            format!(
                "  - {app_name} @ {} ({} token)",
                session.shop,
                session.kind()
            )
        })
        .collect()
}

fn report_lines(report: &SyncReport, app_name: &str) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|result| match result.status {
            SyncStatus::Imported => format!("✓ Imported: {app_name} @ {}", result.shop),
            SyncStatus::Updated => format!("✓ Updated: {app_name} @ {}", result.shop),
            SyncStatus::Failed => format!(
                "✗ Failed: {app_name} @ {}: {}",
                result.shop,
                result.error.as_deref().unwrap_or("unknown error")
            ),
        })
        .collect();

    lines.push(format!(
        "\nSummary: {} imported, {} updated, {} failed",
        report.count(SyncStatus::Imported),
        report.count(SyncStatus::Updated),
        report.count(SyncStatus::Failed),
    ));
    lines
}

#[cfg(test)]
mod tests {
    use api_tester::services::sync::SyncResult;
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_app_name_from_source() {
        assert_eq!(
            app_name_from_source(Path::new("../test-theme-modifier-app/prisma/dev.sqlite"))
                .as_deref(),
            Some("test-theme-modifier-app")
        );
        assert_eq!(
            app_name_from_source(Path::new("/srv/theme-modifier/theme-modifier.sqlite"))
                .as_deref(),
            Some("theme-modifier")
        );
        assert_eq!(app_name_from_source(Path::new("dev.sqlite")), None);
    }

    fn session(shop: &str, token: &str, online: bool) -> SourceSession {
        SourceSession {
            id: if online {
                format!("{shop}_online")
            } else {
                format!("offline_{shop}")
            },
            shop: shop.to_string(),
            access_token: SecretString::from(token),
            scope: Some("read_themes".to_string()),
            is_online: online,
            expires: None,
        }
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("shpat_0123456789abcdef"), "shpat_012345...");
        assert_eq!(token_preview("short"), "short...");
    }

    #[test]
    fn test_describe_groups_by_shop() {
        let sessions = [
            session("b.myshopify.com", "shpat_bbbbbbbbbbbbbbbb", false),
            session("a.myshopify.com", "shpua_aaaaaaaaaaaaaaaa", true),
            session("a.myshopify.com", "shpat_aaaaaaaaaaaaaaaa", false),
        ];
        let lines = describe_sessions(&sessions);
        assert_eq!(lines[0], "  Store: a.myshopify.com");
        assert_eq!(
            lines[1],
            "    - online session: shpua_aaaaaa... (scopes: read_themes)"
        );
        assert_eq!(lines[3], "  Store: b.myshopify.com");
        assert!(lines.iter().all(|l| !l.contains("aaaaaaaaaaaaaaaa")));
    }

    #[test]
    fn test_dry_run_prefers_offline() {
        let sessions = [
            session("a.myshopify.com", "online-token", true),
            session("a.myshopify.com", "offline-token", false),
        ];
        assert_eq!(
            planned_imports(&sessions, "my-app"),
            vec!["  - my-app @ a.myshopify.com (offline token)".to_string()]
        );
    }

    #[test]
    fn test_report_summary() {
        let report = SyncReport {
            sessions_found: 2,
            results: vec![
                SyncResult {
                    shop: "a.myshopify.com".to_string(),
                    status: SyncStatus::Imported,
                    id: None,
                    error: None,
                },
                SyncResult {
                    shop: "bad shop".to_string(),
                    status: SyncStatus::Failed,
                    id: None,
                    error: Some("invalid shop domain: bad shop".to_string()),
                },
            ],
        };
        let lines = report_lines(&report, "my-app");
        assert_eq!(lines[0], "✓ Imported: my-app @ a.myshopify.com");
        assert!(lines[1].starts_with("✗ Failed: my-app @ bad shop"));
        assert_eq!(lines[2], "\nSummary: 1 imported, 0 updated, 1 failed");
    }
}
