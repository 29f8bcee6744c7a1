//! OAuth sessions as stored by the theme modifier app.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// One row of the theme modifier's `Session` table, as seen by the importer.
#[derive(Clone)]
pub struct SourceSession {
    pub id: String,
    pub shop: String,
    pub access_token: SecretString,
    pub scope: Option<String>,
    pub is_online: bool,
    pub expires: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for SourceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("is_online", &self.is_online)
            .field("expires", &self.expires)
            .finish()
    }
}

impl SourceSession {
    /// `"online"` or `"offline"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        if self.is_online { "online" } else { "offline" }
    }
}

/// Pick one session per shop, preferring the offline token.
///
/// When a shop has no offline session the first one encountered wins.
/// Output is ordered by shop.
#[must_use]
pub fn preferred_sessions(sessions: &[SourceSession]) -> Vec<&SourceSession> {
    let mut by_shop: BTreeMap<&str, &SourceSession> = BTreeMap::new();
    for session in sessions {
        by_shop
            .entry(session.shop.as_str())
            .and_modify(|current| {
                if current.is_online && !session.is_online {
                    *current = session;
                }
            })
            .or_insert(session);
    }
    by_shop.into_values().collect()
}
