//! Opaque identifiers for stored credentials.
//!
//! Credential rows are addressed by a UUID v4 rendered as text. The id travels
//! through URLs and the `X-Store-Id` header, so parsing is strict: anything
//! that is not a UUID can never resolve to a row.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid credential id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid store credential id: {0}")]
pub struct StoreCredentialIdError(String);

/// Identifier of a stored credential row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreCredentialId(Uuid);

impl StoreCredentialId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse an id from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `StoreCredentialIdError` if the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, StoreCredentialIdError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| StoreCredentialIdError(s.to_owned()))
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StoreCredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreCredentialId {
    type Err = StoreCredentialIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for StoreCredentialId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(StoreCredentialId::generate(), StoreCredentialId::generate());
    }

    #[test]
    fn test_parse_roundtrips_display() {
        let id = StoreCredentialId::generate();
        let parsed = StoreCredentialId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(StoreCredentialId::parse("not-a-uuid").is_err());
        assert!(StoreCredentialId::parse("").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = StoreCredentialId::parse("6f1c2a9e-0d4b-4a57-9a8e-2c1f0b3d4e5f").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c2a9e-0d4b-4a57-9a8e-2c1f0b3d4e5f\"");
    }
}
