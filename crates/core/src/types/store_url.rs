//! Store URL and shop domain types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when normalizing a [`StoreUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreUrlError {
    /// Nothing left after stripping scheme and trailing slashes.
    #[error("store URL cannot be empty")]
    Empty,
    /// The host contains whitespace.
    #[error("store URL must not contain whitespace")]
    Whitespace,
}

/// A store host with scheme and trailing slashes removed.
///
/// Every store URL is normalized before it is persisted or compared, so
/// `https://example.myshopify.com/` and `example.myshopify.com` address the
/// same record.
///
/// ## Examples
///
/// ```
/// use api_tester_core::StoreUrl;
///
/// let url = StoreUrl::normalize("https://example.myshopify.com/").unwrap();
/// assert_eq!(url.as_str(), "example.myshopify.com");
/// assert!(StoreUrl::normalize("https://").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StoreUrl(String);

impl StoreUrl {
    /// Strip a leading `http://` or `https://` and any trailing `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remaining host is empty or contains whitespace.
    pub fn normalize(s: &str) -> Result<Self, StoreUrlError> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let without_scheme = if lower.starts_with("https://") {
            trimmed.get(8..).unwrap_or_default()
        } else if lower.starts_with("http://") {
            trimmed.get(7..).unwrap_or_default()
        } else {
            trimmed
        };
        let host = without_scheme.trim_end_matches('/');

        if host.is_empty() {
            return Err(StoreUrlError::Empty);
        }
        if host.chars().any(char::is_whitespace) {
            return Err(StoreUrlError::Whitespace);
        }

        Ok(Self(host.to_owned()))
    }

    /// Wrap a value read back from storage, which was normalized on write.
    #[must_use]
    pub const fn from_trusted(s: String) -> Self {
        Self(s)
    }

    /// Returns the normalized host as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StoreUrl {
    type Err = StoreUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl AsRef<str> for StoreUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input does not end in `.myshopify.com`.
    #[error("shop domain must end with .myshopify.com")]
    WrongSuffix,
    /// The store handle contains characters other than `[a-z0-9-]`.
    #[error("shop handle may only contain lowercase letters, digits and hyphens")]
    InvalidHandle,
}

/// A `{handle}.myshopify.com` domain as sent by Shopify in OAuth and app
/// proxy requests.
///
/// ## Constraints
///
/// - Must end in `.myshopify.com`
/// - Handle must be non-empty, start with a letter or digit, and contain only
///   `[a-z0-9-]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a `*.myshopify.com` domain with a
    /// valid handle.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let handle = s
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::WrongSuffix)?;

        let valid_start = handle
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        let valid_chars = handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_start || !valid_chars {
            return Err(ShopDomainError::InvalidHandle);
        }

        Ok(Self(s))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Session id Shopify apps use for the offline token of this shop.
    #[must_use]
    pub fn offline_session_id(&self) -> String {
        format!("offline_{}", self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ShopDomain> for StoreUrl {
    fn from(shop: ShopDomain) -> Self {
        Self(shop.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_scheme_and_slashes() {
        let cases = [
            ("example.myshopify.com", "example.myshopify.com"),
            ("https://example.myshopify.com", "example.myshopify.com"),
            ("http://example.myshopify.com/", "example.myshopify.com"),
            ("HTTPS://example.myshopify.com//", "example.myshopify.com"),
            ("  example.myshopify.com/  ", "example.myshopify.com"),
        ];
        for (input, expected) in cases {
            assert_eq!(StoreUrl::normalize(input).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = StoreUrl::normalize("https://shop.example.com/").unwrap();
        let twice = StoreUrl::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(StoreUrl::normalize(""), Err(StoreUrlError::Empty));
        assert_eq!(StoreUrl::normalize("https://"), Err(StoreUrlError::Empty));
        assert_eq!(StoreUrl::normalize("///"), Err(StoreUrlError::Empty));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            StoreUrl::normalize("my shop.com"),
            Err(StoreUrlError::Whitespace)
        );
    }

    #[test]
    fn test_shop_domain_valid() {
        let shop = ShopDomain::parse("My-Store.myshopify.com").unwrap();
        assert_eq!(shop.as_str(), "my-store.myshopify.com");
        assert_eq!(shop.handle(), "my-store");
        assert_eq!(shop.offline_session_id(), "offline_my-store.myshopify.com");
    }

    #[test]
    fn test_shop_domain_invalid() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(
            ShopDomain::parse("example.com"),
            Err(ShopDomainError::WrongSuffix)
        );
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::InvalidHandle)
        );
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidHandle)
        );
        assert_eq!(
            ShopDomain::parse("-bad.myshopify.com"),
            Err(ShopDomainError::InvalidHandle)
        );
    }

    #[test]
    fn test_shop_domain_into_store_url() {
        let shop = ShopDomain::parse("abc.myshopify.com").unwrap();
        let url: StoreUrl = shop.into();
        assert_eq!(url.as_str(), "abc.myshopify.com");
    }
}
