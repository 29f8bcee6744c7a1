//! Stored Shopify API credential types.
//!
//! A credential row pairs a logical app name with a store and the tokens
//! needed to call that store's Admin API. Tokens are held as
//! [`SecretString`] and never appear in `Debug` output.

use core::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::id::StoreCredentialId;
use super::store_url::StoreUrl;
use crate::DEFAULT_API_VERSION;

/// A stored credential row.
#[derive(Clone)]
pub struct StoreCredential {
    pub id: StoreCredentialId,
    pub name: String,
    pub store_url: StoreUrl,
    pub admin_api_token: SecretString,
    pub storefront_token: Option<SecretString>,
    /// Comma-separated OAuth scopes.
    pub scopes: String,
    pub api_version: String,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for StoreCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field("admin_api_token", &"[REDACTED]")
            .field(
                "storefront_token",
                &self.storefront_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("is_active", &self.is_active)
            .field("notes", &self.notes)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl StoreCredential {
    /// Full JSON view including tokens, for the single-record endpoint.
    #[must_use]
    pub fn reveal(&self) -> StoreCredentialDetail {
        StoreCredentialDetail {
            id: self.id,
            name: self.name.clone(),
            store_url: self.store_url.clone(),
            admin_api_token: self.admin_api_token.expose_secret().to_owned(),
            storefront_token: self
                .storefront_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            scopes: self.scopes.clone(),
            api_version: self.api_version.clone(),
            is_active: self.is_active,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Credential view without tokens, used by list endpoints and pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCredentialSummary {
    pub id: StoreCredentialId,
    pub name: String,
    pub store_url: StoreUrl,
    pub scopes: String,
    pub api_version: String,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoreCredential> for StoreCredentialSummary {
    fn from(c: &StoreCredential) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            store_url: c.store_url.clone(),
            scopes: c.scopes.clone(),
            api_version: c.api_version.clone(),
            is_active: c.is_active,
            notes: c.notes.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Credential view with tokens exposed.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCredentialDetail {
    pub id: StoreCredentialId,
    pub name: String,
    pub store_url: StoreUrl,
    pub admin_api_token: String,
    pub storefront_token: Option<String>,
    pub scopes: String,
    pub api_version: String,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a credential from the dashboard or JSON API.
#[derive(Clone)]
pub struct NewStoreCredential {
    pub name: String,
    pub store_url: StoreUrl,
    pub admin_api_token: SecretString,
    pub storefront_token: Option<SecretString>,
    pub scopes: String,
    pub api_version: String,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl fmt::Debug for NewStoreCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewStoreCredential")
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field("admin_api_token", &"[REDACTED]")
            .field(
                "storefront_token",
                &self.storefront_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("notes", &self.notes)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears a
/// nullable one.
#[derive(Clone, Default)]
pub struct StoreCredentialPatch {
    pub name: Option<String>,
    pub store_url: Option<StoreUrl>,
    pub admin_api_token: Option<SecretString>,
    pub storefront_token: Option<Option<SecretString>>,
    pub scopes: Option<String>,
    pub api_version: Option<String>,
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl fmt::Debug for StoreCredentialPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentialPatch")
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field(
                "admin_api_token",
                &self.admin_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "storefront_token",
                &self.storefront_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("notes", &self.notes)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// A credential pushed by a remote app or read from its session table.
///
/// Upserted on `(store_url, app_name)`.
#[derive(Clone)]
pub struct CredentialRegistration {
    pub app_name: String,
    pub store_url: StoreUrl,
    pub admin_api_token: SecretString,
    pub storefront_token: Option<SecretString>,
    pub scopes: String,
    /// Replaces the stored version when set; new rows fall back to
    /// [`DEFAULT_API_VERSION`].
    pub api_version: Option<String>,
}

impl CredentialRegistration {
    /// API version to use when inserting a new row.
    #[must_use]
    pub fn api_version_or_default(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }
}

impl fmt::Debug for CredentialRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRegistration")
            .field("app_name", &self.app_name)
            .field("store_url", &self.store_url)
            .field("admin_api_token", &"[REDACTED]")
            .field(
                "storefront_token",
                &self.storefront_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(StoreCredentialId),
    Updated(StoreCredentialId),
}

impl UpsertOutcome {
    /// Id of the affected row.
    #[must_use]
    pub const fn id(&self) -> StoreCredentialId {
        match self {
            Self::Created(id) | Self::Updated(id) => *id,
        }
    }

    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> StoreCredential {
        StoreCredential {
            id: StoreCredentialId::generate(),
            name: "test-app".to_owned(),
            store_url: StoreUrl::normalize("demo.myshopify.com").unwrap(),
            admin_api_token: SecretString::from("shpat_supersecret".to_owned()),
            storefront_token: Some(SecretString::from("sf_secret".to_owned())),
            scopes: "read_themes, write_themes,".to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            is_active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("shpat_supersecret"));
        assert!(!debug.contains("sf_secret"));
    }

    #[test]
    fn test_summary_omits_tokens() {
        let json = serde_json::to_value(StoreCredentialSummary::from(&sample())).unwrap();
        assert!(json.get("adminApiToken").is_none());
        assert!(json.get("storefrontToken").is_none());
        assert_eq!(json["storeUrl"], "demo.myshopify.com");
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn test_reveal_exposes_tokens() {
        let json = serde_json::to_value(sample().reveal()).unwrap();
        assert_eq!(json["adminApiToken"], "shpat_supersecret");
        assert_eq!(json["storefrontToken"], "sf_secret");
    }

    #[test]
    fn test_registration_default_version() {
        let reg = CredentialRegistration {
            app_name: "app".to_owned(),
            store_url: StoreUrl::normalize("a.myshopify.com").unwrap(),
            admin_api_token: SecretString::from("tok".to_owned()),
            storefront_token: None,
            scopes: String::new(),
            api_version: None,
        };
        assert_eq!(reg.api_version_or_default(), "2025-01");
        assert!(!format!("{reg:?}").contains("tok\""));
    }

    #[test]
    fn test_upsert_outcome() {
        let id = StoreCredentialId::generate();
        assert!(UpsertOutcome::Created(id).is_created());
        assert!(!UpsertOutcome::Updated(id).is_created());
        assert_eq!(UpsertOutcome::Updated(id).id(), id);
    }
}
