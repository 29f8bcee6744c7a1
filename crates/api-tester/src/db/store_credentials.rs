//! Store credential repository.
//!
//! Queries are runtime-checked (`sqlx::query_as`) against the `SQLite` schema
//! in `migrations/`. Every write that touches the active marker runs inside a
//! transaction so the "at most one active row" index is never observed
//! mid-switch.
//!
//! Read-then-write transactions start with `BEGIN IMMEDIATE`: they hold the
//! `SQLite` write lock from the first statement, so overlapping requests
//! wait on the busy timeout rather than failing with `SQLITE_BUSY`.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::instrument;

use api_tester_core::{
    CredentialRegistration, NewStoreCredential, StoreCredential, StoreCredentialId,
    StoreCredentialPatch, StoreUrl, UpsertOutcome,
};

use super::RepositoryError;

const SELECT_COLUMNS: &str = r"
    SELECT id, name, store_url, admin_api_token, storefront_token, scopes,
           api_version, is_active, notes, created_at, updated_at
    FROM store_credentials
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StoreCredentialRow {
    id: String,
    name: String,
    store_url: String,
    admin_api_token: String,
    storefront_token: Option<String>,
    scopes: String,
    api_version: String,
    is_active: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreCredentialRow> for StoreCredential {
    type Error = RepositoryError;

    fn try_from(row: StoreCredentialRow) -> Result<Self, Self::Error> {
        let id = StoreCredentialId::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid id in database: {e}"))
        })?;

        Ok(Self {
            id,
            name: row.name,
            store_url: StoreUrl::from_trusted(row.store_url),
            admin_api_token: SecretString::from(row.admin_api_token),
            storefront_token: row.storefront_token.map(SecretString::from),
            scopes: row.scopes,
            api_version: row.api_version,
            is_active: row.is_active,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store credential database operations.
pub struct StoreCredentialRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StoreCredentialRepository<'a> {
    /// Create a new store credential repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    /// List all credentials, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self) -> Result<Vec<StoreCredential>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreCredentialRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY updated_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a credential by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(
        &self,
        id: StoreCredentialId,
    ) -> Result<Option<StoreCredential>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Insert a new credential.
    ///
    /// When `is_active` is set every other row is deactivated in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `(store_url, name)` already exists.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, new), fields(name = %new.name, store_url = %new.store_url))]
    pub async fn create(
        &self,
        new: &NewStoreCredential,
    ) -> Result<StoreCredential, RepositoryError> {
        let id = StoreCredentialId::generate();
        let now = Utc::now();
        let mut tx = self.begin_write().await?;

        if new.is_active {
            deactivate_all(&mut tx).await?;
        }

        sqlx::query(
            r"
            INSERT INTO store_credentials
                (id, name, store_url, admin_api_token, storefront_token, scopes,
                 api_version, is_active, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&new.name)
        .bind(new.store_url.as_str())
        .bind(new.admin_api_token.expose_secret())
        .bind(new.storefront_token.as_ref().map(|t| t.expose_secret()))
        .bind(&new.scopes)
        .bind(&new.api_version)
        .bind(new.is_active)
        .bind(&new.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let created = find_by_id(&mut tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// `is_active: Some(true)` deactivates all other rows in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    /// Returns `RepositoryError::Conflict` if the new `(store_url, name)` is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(
        &self,
        id: StoreCredentialId,
        patch: &StoreCredentialPatch,
    ) -> Result<StoreCredential, RepositoryError> {
        let mut tx = self.begin_write().await?;

        let existing = find_by_id(&mut tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if patch.is_active == Some(true) {
            deactivate_all(&mut tx).await?;
        }

        let name = patch.name.as_ref().unwrap_or(&existing.name);
        let store_url = patch.store_url.as_ref().unwrap_or(&existing.store_url);
        let admin_api_token = patch
            .admin_api_token
            .as_ref()
            .unwrap_or(&existing.admin_api_token);
        let storefront_token = patch
            .storefront_token
            .as_ref()
            .map_or(existing.storefront_token.as_ref(), Option::as_ref);
        let scopes = patch.scopes.as_ref().unwrap_or(&existing.scopes);
        let api_version = patch.api_version.as_ref().unwrap_or(&existing.api_version);
        let notes = patch
            .notes
            .as_ref()
            .map_or(existing.notes.as_ref(), Option::as_ref);
        let is_active = patch.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r"
            UPDATE store_credentials
            SET name = ?, store_url = ?, admin_api_token = ?, storefront_token = ?,
                scopes = ?, api_version = ?, notes = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(name)
        .bind(store_url.as_str())
        .bind(admin_api_token.expose_secret())
        .bind(storefront_token.map(|t| t.expose_secret()))
        .bind(scopes)
        .bind(api_version)
        .bind(notes)
        .bind(is_active)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        let updated = find_by_id(&mut tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Make one credential the active one and deactivate the rest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn set_active(&self, id: StoreCredentialId) -> Result<(), RepositoryError> {
        let mut tx = self.begin_write().await?;

        if find_by_id(&mut tx, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        deactivate_all(&mut tx).await?;
        sqlx::query("UPDATE store_credentials SET is_active = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: StoreCredentialId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store_credentials WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or refresh a credential keyed on `(store_url, app_name)`.
    ///
    /// On update the tokens and scopes are replaced; the API version is
    /// replaced only when the registration carries one. Whether the row
    /// existed is decided inside the same transaction as the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, registration), fields(app_name = %registration.app_name, store_url = %registration.store_url))]
    pub async fn upsert_registration(
        &self,
        registration: &CredentialRegistration,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.begin_write().await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM store_credentials WHERE store_url = ? AND name = ?",
        )
        .bind(registration.store_url.as_str())
        .bind(&registration.app_name)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = if let Some(raw_id) = existing {
            let id = StoreCredentialId::parse(&raw_id).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid id in database: {e}"))
            })?;

            sqlx::query(
                r"
                UPDATE store_credentials
                SET admin_api_token = ?, storefront_token = ?, scopes = ?,
                    api_version = COALESCE(?, api_version), updated_at = ?
                WHERE id = ?
                ",
            )
            .bind(registration.admin_api_token.expose_secret())
            .bind(
                registration
                    .storefront_token
                    .as_ref()
                    .map(|t| t.expose_secret()),
            )
            .bind(&registration.scopes)
            .bind(registration.api_version.as_deref())
            .bind(now)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

            UpsertOutcome::Updated(id)
        } else {
            let id = StoreCredentialId::generate();

            sqlx::query(
                r"
                INSERT INTO store_credentials
                    (id, name, store_url, admin_api_token, storefront_token, scopes,
                     api_version, is_active, notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)
                ",
            )
            .bind(id.to_string())
            .bind(&registration.app_name)
            .bind(registration.store_url.as_str())
            .bind(registration.admin_api_token.expose_secret())
            .bind(
                registration
                    .storefront_token
                    .as_ref()
                    .map(|t| t.expose_secret()),
            )
            .bind(&registration.scopes)
            .bind(registration.api_version_or_default())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            UpsertOutcome::Created(id)
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn find_by_id(
    conn: &mut SqliteConnection,
    id: StoreCredentialId,
) -> Result<Option<StoreCredential>, RepositoryError> {
    let row = sqlx::query_as::<_, StoreCredentialRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?;

    row.map(TryInto::try_into).transpose()
}

async fn deactivate_all(conn: &mut SqliteConnection) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE store_credentials SET is_active = 0 WHERE is_active = 1")
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn new_credential(name: &str, url: &str) -> NewStoreCredential {
        NewStoreCredential {
            name: name.to_string(),
            store_url: StoreUrl::normalize(url).unwrap(),
            admin_api_token: SecretString::from("shpat_token"),
            storefront_token: None,
            scopes: "read_themes,write_themes".to_string(),
            api_version: "2025-01".to_string(),
            notes: None,
            is_active: false,
        }
    }

    fn registration(name: &str, url: &str, token: &str) -> CredentialRegistration {
        CredentialRegistration {
            app_name: name.to_string(),
            store_url: StoreUrl::normalize(url).unwrap(),
            admin_api_token: SecretString::from(token.to_string()),
            storefront_token: None,
            scopes: "read_themes".to_string(),
            api_version: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let created = repo
            .create(&new_credential("app", "https://a.myshopify.com/"))
            .await
            .unwrap();
        assert_eq!(created.store_url.as_str(), "a.myshopify.com");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "app");
        assert_eq!(fetched.admin_api_token.expose_secret(), "shpat_token");
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        repo.create(&new_credential("app", "a.myshopify.com"))
            .await
            .unwrap();
        let err = repo
            .create(&new_credential("app", "https://a.myshopify.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let first = repo
            .upsert_registration(&registration("app", "a.myshopify.com", "one"))
            .await
            .unwrap();
        let second = repo
            .upsert_registration(&registration("app", "https://a.myshopify.com/", "two"))
            .await
            .unwrap();

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.id(), second.id());

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].admin_api_token.expose_secret(), "two");
        assert_eq!(all[0].api_version, "2025-01");
    }

    #[tokio::test]
    async fn test_set_active_leaves_one_active() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let mut a = new_credential("a", "a.myshopify.com");
        a.is_active = true;
        let a = repo.create(&a).await.unwrap();
        let b = repo
            .create(&new_credential("b", "b.myshopify.com"))
            .await
            .unwrap();

        repo.set_active(b.id).await.unwrap();

        let active: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
        assert!(!repo.get(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_is_active_deactivates_others() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let mut a = new_credential("a", "a.myshopify.com");
        a.is_active = true;
        let a = repo.create(&a).await.unwrap();
        let b = repo
            .create(&new_credential("b", "b.myshopify.com"))
            .await
            .unwrap();

        let patch = StoreCredentialPatch {
            is_active: Some(true),
            notes: Some(Some("primary".to_string())),
            ..Default::default()
        };
        let updated = repo.update(b.id, &patch).await.unwrap();
        assert!(updated.is_active);
        assert_eq!(updated.notes.as_deref(), Some("primary"));
        assert_eq!(updated.name, "b");

        let active: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
        assert!(!repo.get(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_clears_nullable_columns() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let mut new = new_credential("a", "a.myshopify.com");
        new.storefront_token = Some(SecretString::from("sf_token"));
        new.notes = Some("temporary".to_string());
        let created = repo.create(&new).await.unwrap();

        let keep = StoreCredentialPatch {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        let kept = repo.update(created.id, &keep).await.unwrap();
        assert_eq!(kept.notes.as_deref(), Some("temporary"));
        assert!(kept.storefront_token.is_some());

        let clear = StoreCredentialPatch {
            storefront_token: Some(None),
            notes: Some(None),
            ..Default::default()
        };
        let cleared = repo.update(created.id, &clear).await.unwrap();
        assert!(cleared.notes.is_none());
        assert!(cleared.storefront_token.is_none());
        assert_eq!(cleared.name, "renamed");
    }

    async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
        let url = format!("sqlite://{}", dir.path().join("credentials.sqlite").display());
        let pool = crate::db::create_pool(&SecretString::from(url)).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_active_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let pool = file_pool(&dir).await;
        let repo = StoreCredentialRepository::new(&pool);

        let mut ids = Vec::new();
        for i in 0..8 {
            let created = repo
                .create(&new_credential(&format!("app{i}"), &format!("s{i}.myshopify.com")))
                .await
                .unwrap();
            ids.push(created.id);
        }

        let tasks: Vec<_> = ids
            .iter()
            .copied()
            .cycle()
            .take(40)
            .map(|id| {
                let pool = pool.clone();
                tokio::spawn(
                    async move { StoreCredentialRepository::new(&pool).set_active(id).await },
                )
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let active = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active)
            .count();
        assert_eq!(active, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_share_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let pool = file_pool(&dir).await;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    StoreCredentialRepository::new(&pool)
                        .upsert_registration(&registration(
                            "app",
                            "a.myshopify.com",
                            &format!("token-{i}"),
                        ))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().is_created() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        let repo = StoreCredentialRepository::new(&pool);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);
        let id = StoreCredentialId::generate();

        assert!(repo.get(id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.set_active(id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.update(id, &StoreCredentialPatch::default()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = testing::pool().await;
        let repo = StoreCredentialRepository::new(&pool);

        let created = repo
            .create(&new_credential("app", "a.myshopify.com"))
            .await
            .unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}
