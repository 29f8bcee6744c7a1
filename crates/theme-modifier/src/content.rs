//! Storefront content served to the SDK.
//!
//! HTML fragments come from `templates/content/fragment.html`; JSON payloads
//! are built here. Both exist in two flavours: fetched directly over CORS or
//! relayed through the Shopify app proxy.

use askama::Template;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::{Value, json};

/// How the request reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Cross-origin fetch to `/api/*`.
    Direct,
    /// Same-origin fetch relayed from `/apps/sdk/*`.
    AppProxy,
}

/// `?variant=` for HTML content. Unknown values fall back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVariant {
    Default,
    Promo,
    Announcement,
}

impl ContentVariant {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("promo") => Self::Promo,
            Some("announcement") => Self::Announcement,
            _ => Self::Default,
        }
    }
}

/// `?type=` for JSON data. Unknown values fall back to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    General,
    Products,
    Config,
    Stats,
}

impl DataKind {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("products") => Self::Products,
            Some("config") => Self::Config,
            Some("stats") => Self::Stats,
            _ => Self::General,
        }
    }
}

#[derive(Template)]
#[template(path = "content/fragment.html")]
struct ContentFragment {
    variant: ContentVariant,
    via_proxy: bool,
    timestamp: String,
    valid_until: String,
}

/// Render the HTML fragment for a variant.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn render_content(
    variant: ContentVariant,
    channel: Channel,
    now: DateTime<Utc>,
) -> Result<String, askama::Error> {
    ContentFragment {
        variant,
        via_proxy: channel == Channel::AppProxy,
        timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        valid_until: (now + Duration::days(7)).format("%-m/%-d/%Y").to_string(),
    }
    .render()
}

/// Build the JSON payload for a data kind.
#[must_use]
pub fn data_payload(kind: DataKind, channel: Channel, now: DateTime<Utc>) -> Value {
    let timestamp = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let mut payload = match kind {
        DataKind::Products => json!({
            "success": true,
            "type": "products",
            "timestamp": timestamp,
            "items": [
                { "id": 1, "name": "Product A", "price": 29.99, "inStock": true },
                { "id": 2, "name": "Product B", "price": 49.99, "inStock": true },
                { "id": 3, "name": "Product C", "price": 19.99, "inStock": false },
            ],
            "total": 3,
        }),
        DataKind::Config => json!({
            "success": true,
            "type": "config",
            "timestamp": timestamp,
            "settings": {
                "theme": "light",
                "showPrices": true,
                "currency": "USD",
                "locale": "en-US",
            },
        }),
        DataKind::Stats => {
            let mut rng = rand::rng();
            json!({
                "success": true,
                "type": "stats",
                "timestamp": timestamp,
                "metrics": {
                    "visitors": rng.random_range(0..1000),
                    "pageViews": rng.random_range(0..5000),
                    "conversionRate": format!("{:.2}%", rng.random_range(0.0..5.0)),
                },
            })
        }
        DataKind::General => match channel {
            Channel::Direct => json!({
                "success": true,
                "type": "general",
                "message": "Hello from the API!",
                "timestamp": timestamp,
                "description": "This JSON data was fetched from the app server.",
                "items": ["Item 1", "Item 2", "Item 3"],
                "metadata": {
                    "version": env!("CARGO_PKG_VERSION"),
                    "environment": if cfg!(debug_assertions) { "development" } else { "production" },
                },
            }),
            Channel::AppProxy => json!({
                "success": true,
                "type": "general",
                "message": "Hello from the App Proxy!",
                "timestamp": timestamp,
                "items": ["Item 1", "Item 2", "Item 3"],
            }),
        },
    };

    if channel == Channel::AppProxy
        && let Some(object) = payload.as_object_mut()
    {
        object.insert("source".to_string(), json!("app-proxy"));
    }

    payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_variant_parse_falls_back() {
        assert_eq!(ContentVariant::parse(Some("promo")), ContentVariant::Promo);
        assert_eq!(ContentVariant::parse(Some("nope")), ContentVariant::Default);
        assert_eq!(ContentVariant::parse(None), ContentVariant::Default);
        assert_eq!(DataKind::parse(Some("stats")), DataKind::Stats);
        assert_eq!(DataKind::parse(Some("")), DataKind::General);
    }

    #[test]
    fn test_promo_valid_for_a_week() {
        let html = render_content(ContentVariant::Promo, Channel::Direct, now()).unwrap();
        assert!(html.contains("app-content--promo"));
        assert!(html.contains("SAVE20"));
        assert!(html.contains("3/8/2025"));
    }

    #[test]
    fn test_default_wording_depends_on_channel() {
        let direct = render_content(ContentVariant::Default, Channel::Direct, now()).unwrap();
        assert!(direct.contains("fetched from the app server"));
        assert!(direct.contains("2025-03-01T12:00:00.000Z"));

        let proxied = render_content(ContentVariant::Default, Channel::AppProxy, now()).unwrap();
        assert!(proxied.contains("loaded via App Proxy"));
    }

    #[test]
    fn test_announcement() {
        let html = render_content(ContentVariant::Announcement, Channel::Direct, now()).unwrap();
        assert!(html.contains("New Arrivals!"));
    }

    #[test]
    fn test_data_products() {
        let data = data_payload(DataKind::Products, Channel::Direct, now());
        assert_eq!(data["type"], "products");
        assert_eq!(data["items"].as_array().unwrap().len(), 3);
        assert_eq!(data["total"], 3);
        assert!(data.get("source").is_none());
    }

    #[test]
    fn test_data_stats_ranges() {
        let data = data_payload(DataKind::Stats, Channel::Direct, now());
        let visitors = data["metrics"]["visitors"].as_i64().unwrap();
        assert!((0..1000).contains(&visitors));
        assert!(data["metrics"]["conversionRate"].as_str().unwrap().ends_with('%'));
    }

    #[test]
    fn test_app_proxy_data_is_tagged() {
        let data = data_payload(DataKind::General, Channel::AppProxy, now());
        assert_eq!(data["source"], "app-proxy");
        assert_eq!(data["message"], "Hello from the App Proxy!");
    }
}
