//! Import OAuth sessions from the theme modifier into the credential store.
//!
//! The importer depends on a [`SessionSource`], not on a file path. The
//! production source reads the theme modifier's `Session` table from its
//! `SQLite` file, opened read-only.

use std::future::Future;
use std::path::{Path, PathBuf};

use api_tester_core::{
    CredentialRegistration, SourceSession, StoreCredentialId, StoreUrl, UpsertOutcome,
    preferred_sessions,
};
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use serde::Serialize;
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use thiserror::Error;
use tracing::instrument;

use crate::db::StoreCredentialRepository;

/// Errors that abort a whole sync run. Per-shop failures are reported in
/// [`SyncReport::results`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured source database file does not exist.
    #[error("Source database not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Reading the source database failed.
    #[error("failed to read source sessions: {0}")]
    Source(#[from] sqlx::Error),
}

/// Anything that can list OAuth sessions to import.
pub trait SessionSource {
    /// Sessions with a non-empty access token, ordered by shop.
    fn load_sessions(&self) -> impl Future<Output = Result<Vec<SourceSession>, SyncError>> + Send;
}

// =============================================================================
// SQLite source
// =============================================================================

/// Reads the theme modifier's `Session` table.
#[derive(Debug, Clone)]
pub struct SqliteSessionSource {
    path: PathBuf,
}

impl SqliteSessionSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    #[sqlx(rename = "accessToken")]
    access_token: String,
    scope: Option<String>,
    #[sqlx(rename = "isOnline")]
    is_online: bool,
    expires: Option<String>,
}

impl From<SessionRow> for SourceSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scope: row.scope,
            is_online: row.is_online,
            expires: row.expires.as_deref().and_then(parse_expires),
        }
    }
}

/// `expires` is stored either as epoch milliseconds or as an RFC 3339 string.
fn parse_expires(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single();
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl SessionSource for SqliteSessionSource {
    async fn load_sessions(&self) -> Result<Vec<SourceSession>, SyncError> {
        if !self.path.exists() {
            return Err(SyncError::SourceMissing(self.path.clone()));
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true);
        let mut conn = SqliteConnection::connect_with(&options).await?;

        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, shop, accessToken, scope, isOnline, CAST(expires AS TEXT) AS expires
            FROM "Session"
            WHERE accessToken IS NOT NULL AND accessToken != ''
            ORDER BY shop
            "#,
        )
        .fetch_all(&mut conn)
        .await?;

        conn.close().await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Sync
// =============================================================================

/// Per-shop result of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Imported,
    Updated,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub shop: String,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<StoreCredentialId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Sessions returned by the source before grouping by shop.
    pub sessions_found: usize,
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    #[must_use]
    pub fn count(&self, status: SyncStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// `Synced N/M stores (I new, U updated)`.
    #[must_use]
    pub fn message(&self) -> String {
        let imported = self.count(SyncStatus::Imported);
        let updated = self.count(SyncStatus::Updated);
        format!(
            "Synced {}/{} stores ({imported} new, {updated} updated)",
            imported + updated,
            self.results.len()
        )
    }
}

/// Registration that would be upserted for one session.
#[must_use]
pub fn registration_for(
    session: &SourceSession,
    app_name: &str,
) -> Option<CredentialRegistration> {
    let store_url = StoreUrl::normalize(&session.shop).ok()?;
    Some(CredentialRegistration {
        app_name: app_name.to_string(),
        store_url,
        admin_api_token: session.access_token.clone(),
        storefront_token: None,
        scopes: session.scope.clone().unwrap_or_default(),
        api_version: None,
    })
}

/// Load sessions from `source` and upsert one credential per shop.
///
/// A zero-session source touches no rows. A failure on one shop is
/// recorded and the batch continues.
///
/// # Errors
///
/// Returns `SyncError` only if the source itself cannot be read.
#[instrument(skip(repo, source))]
pub async fn sync_sessions<S: SessionSource + Sync>(
    repo: &StoreCredentialRepository<'_>,
    source: &S,
    app_name: &str,
) -> Result<SyncReport, SyncError> {
    let sessions = source.load_sessions().await?;
    let mut report = SyncReport {
        sessions_found: sessions.len(),
        results: Vec::new(),
    };

    if sessions.is_empty() {
        tracing::info!("No sessions to sync");
        return Ok(report);
    }

    for session in preferred_sessions(&sessions) {
        let result = match registration_for(session, app_name) {
            None => SyncResult {
                shop: session.shop.clone(),
                status: SyncStatus::Failed,
                id: None,
                error: Some(format!("invalid shop domain: {}", session.shop)),
            },
            Some(registration) => match repo.upsert_registration(&registration).await {
                Ok(outcome) => SyncResult {
                    shop: session.shop.clone(),
                    status: match outcome {
                        UpsertOutcome::Created(_) => SyncStatus::Imported,
                        UpsertOutcome::Updated(_) => SyncStatus::Updated,
                    },
                    id: Some(outcome.id()),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(shop = %session.shop, error = %e, "Failed to sync session");
                    SyncResult {
                        shop: session.shop.clone(),
                        status: SyncStatus::Failed,
                        id: None,
                        error: Some(e.to_string()),
                    }
                }
            },
        };
        report.results.push(result);
    }

    tracing::info!(message = %report.message(), "Session sync finished");
    Ok(report)
}
