//! API tester core - shared types library.
//!
//! This crate provides the types shared by the workspace components:
//! - `api-tester` - Credential dashboard and Shopify Admin GraphQL proxy
//! - `theme-modifier` - Merchant-facing Shopify app (OAuth, storefront content, SDK)
//! - `cli` - Command-line tools for migrations and credential import
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and constants - no I/O,
//! no database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Credential records, store URLs, shop domains and source sessions
//! - [`themes`] - GraphQL documents for the Online Store theme API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod themes;
pub mod types;

pub use types::*;

/// Admin API version used when a caller does not specify one.
pub const DEFAULT_API_VERSION: &str = "2025-01";

/// Name under which the theme modifier app registers its credentials.
pub const DEFAULT_APP_NAME: &str = "test-theme-modifier-app";

/// Theme modifier session database, relative to the workspace root both
/// servers run from. The API tester's sync reads the same file.
pub const THEME_MODIFIER_DATABASE_FILE: &str = "theme-modifier.sqlite";

/// Default `SQLite` URL for the theme modifier, created on first use.
///
/// ```
/// assert_eq!(
///     api_tester_core::theme_modifier_database_url(),
///     "sqlite://theme-modifier.sqlite?mode=rwc"
/// );
/// ```
#[must_use]
pub fn theme_modifier_database_url() -> String {
    format!("sqlite://{THEME_MODIFIER_DATABASE_FILE}?mode=rwc")
}
