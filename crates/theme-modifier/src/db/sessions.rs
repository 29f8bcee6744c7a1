//! `Session` table repository.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;

use api_tester_core::{ShopDomain, SourceSession};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    #[sqlx(rename = "accessToken")]
    access_token: String,
    scope: Option<String>,
    #[sqlx(rename = "isOnline")]
    is_online: bool,
    expires: Option<DateTime<Utc>>,
}

impl From<SessionRow> for SourceSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scope: row.scope,
            is_online: row.is_online,
            expires: row.expires,
        }
    }
}

/// Repository for OAuth sessions.
pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a session by id.
    ///
    /// `state` is the OAuth nonce the session was created from.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn store(&self, session: &SourceSession, state: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO "Session" (id, shop, state, isOnline, scope, expires, accessToken)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                shop = excluded.shop,
                state = excluded.state,
                isOnline = excluded.isOnline,
                scope = excluded.scope,
                expires = excluded.expires,
                accessToken = excluded.accessToken
            "#,
        )
        .bind(&session.id)
        .bind(&session.shop)
        .bind(state)
        .bind(session.is_online)
        .bind(&session.scope)
        .bind(session.expires)
        .bind(session.access_token.expose_secret())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// The offline session for a shop, if the app is installed there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_offline(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<SourceSession>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, shop, accessToken, scope, isOnline, expires
            FROM "Session"
            WHERE id = ? AND isOnline = 0
            "#,
        )
        .bind(shop.offline_session_id())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
