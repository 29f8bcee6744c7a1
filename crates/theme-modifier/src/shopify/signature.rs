//! HMAC-SHA256 request signatures Shopify attaches to redirects and proxied
//! requests.
//!
//! Two formats exist:
//!
//! - **OAuth** (`hmac` parameter): remaining parameters sorted by key and
//!   form-encoded as `a=1&b=2`.
//! - **App proxy** (`signature` parameter): remaining parameters sorted by
//!   key, repeated keys joined with `,`, concatenated as `a=1b=2` with no
//!   separator and no encoding.
//!
//! Both digests are lowercase hex and are compared in constant time.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &SecretString, message: &str) -> Option<HmacSha256> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return None;
    };
    mac.update(message.as_bytes());
    Some(mac)
}

fn hex_digest(secret: &SecretString, message: &str) -> Option<String> {
    keyed_mac(secret, message).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

fn verify(secret: &SecretString, message: &str, provided_hex: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Some(mac) = keyed_mac(secret, message) else {
        return false;
    };
    mac.verify_slice(&provided).is_ok()
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// =============================================================================
// OAuth
// =============================================================================

fn oauth_message<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: Vec<(&str, &str)> = pairs
        .filter(|(k, _)| *k != "hmac" && *k != "signature")
        .collect();
    sorted.sort_unstable();

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}

/// Hex HMAC for a set of OAuth redirect parameters.
///
/// `None` only if the secret is rejected as an HMAC key.
#[must_use]
pub fn sign_oauth_params(params: &[(&str, &str)], secret: &SecretString) -> Option<String> {
    hex_digest(secret, &oauth_message(params.iter().copied()))
}

/// Check the `hmac` parameter of an OAuth redirect query string.
///
/// Returns `false` when the parameter is missing or malformed.
#[must_use]
pub fn verify_oauth_hmac(query: &str, secret: &SecretString) -> bool {
    let pairs = decode_pairs(query);
    let Some(provided) = pairs.iter().find(|(k, _)| k == "hmac").map(|(_, v)| v) else {
        return false;
    };
    let message = oauth_message(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    verify(secret, &message, provided)
}

// =============================================================================
// App proxy
// =============================================================================

fn proxy_message<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs.filter(|(k, _)| *k != "signature") {
        grouped.entry(key).or_default().push(value);
    }

    grouped
        .into_iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect()
}

/// Hex signature for a set of app proxy parameters.
///
/// `None` only if the secret is rejected as an HMAC key.
#[must_use]
pub fn sign_proxy_params(params: &[(&str, &str)], secret: &SecretString) -> Option<String> {
    hex_digest(secret, &proxy_message(params.iter().copied()))
}

/// Check the `signature` parameter of an app proxy query string.
///
/// Returns `false` when the parameter is missing or malformed.
#[must_use]
pub fn verify_proxy_signature(query: &str, secret: &SecretString) -> bool {
    let pairs = decode_pairs(query);
    let Some(provided) = pairs
        .iter()
        .find(|(k, _)| k == "signature")
        .map(|(_, v)| v)
    else {
        return false;
    };
    let message = proxy_message(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    verify(secret, &message, provided)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("hush")
    }

    #[test]
    fn test_oauth_message_sorted_without_hmac() {
        let message = oauth_message(
            [
                ("timestamp", "1337178173"),
                ("hmac", "ignored"),
                ("code", "0907a61c0c8d55e99db179b68161bc00"),
                ("shop", "some-shop.myshopify.com"),
            ]
            .into_iter(),
        );
        assert_eq!(
            message,
            "code=0907a61c0c8d55e99db179b68161bc00&shop=some-shop.myshopify.com&timestamp=1337178173"
        );
    }

    #[test]
    fn test_oauth_roundtrip_and_tamper() {
        let params = [
            ("code", "abc123"),
            ("shop", "my-shop.myshopify.com"),
            ("state", "nonce"),
            ("timestamp", "1700000000"),
        ];
        let hmac = sign_oauth_params(&params, &secret()).unwrap();
        let query = format!(
            "code=abc123&hmac={hmac}&shop=my-shop.myshopify.com&state=nonce&timestamp=1700000000"
        );
        assert!(verify_oauth_hmac(&query, &secret()));

        let tampered = query.replace("my-shop", "other-shop");
        assert!(!verify_oauth_hmac(&tampered, &secret()));
        assert!(!verify_oauth_hmac(&query, &SecretString::from("wrong")));
    }

    #[test]
    fn test_digest_is_lowercase_hex_sha256() {
        let digest = hex_digest(&secret(), "shop=a.myshopify.com").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
        // Empty and oversized keys are both valid for HMAC
        assert!(hex_digest(&SecretString::from(""), "x").is_some());
        assert!(hex_digest(&SecretString::from("k".repeat(200)), "x").is_some());
    }

    #[test]
    fn test_empty_secret_still_verifies() {
        let empty = SecretString::from("");
        let hmac = sign_oauth_params(&[("shop", "a.myshopify.com")], &empty).unwrap();
        assert!(verify_oauth_hmac(
            &format!("shop=a.myshopify.com&hmac={hmac}"),
            &empty
        ));
    }

    #[test]
    fn test_oauth_missing_or_garbage_hmac() {
        assert!(!verify_oauth_hmac("shop=a.myshopify.com", &secret()));
        assert!(!verify_oauth_hmac("shop=a.myshopify.com&hmac=zz", &secret()));
    }

    #[test]
    fn test_proxy_message_joins_repeated_keys() {
        let message = proxy_message(
            [
                ("shop", "shop-name.myshopify.com"),
                ("extra", "1"),
                ("extra", "2"),
                ("path_prefix", "/apps/sdk"),
                ("signature", "ignored"),
                ("timestamp", "1317327555"),
            ]
            .into_iter(),
        );
        assert_eq!(
            message,
            "extra=1,2path_prefix=/apps/sdkshop=shop-name.myshopify.comtimestamp=1317327555"
        );
    }

    #[test]
    fn test_proxy_roundtrip() {
        let params = [
            ("logged_in_customer_id", ""),
            ("path_prefix", "/apps/sdk"),
            ("shop", "my-shop.myshopify.com"),
            ("timestamp", "1700000000"),
        ];
        let signature = sign_proxy_params(&params, &secret()).unwrap();
        let query = format!(
            "shop=my-shop.myshopify.com&logged_in_customer_id=&path_prefix=%2Fapps%2Fsdk&timestamp=1700000000&signature={signature}"
        );
        assert!(verify_proxy_signature(&query, &secret()));
        assert!(!verify_proxy_signature(
            &query.replace("1700000000", "1700000001"),
            &secret()
        ));
        assert!(!verify_proxy_signature("shop=my-shop.myshopify.com", &secret()));
    }
}
