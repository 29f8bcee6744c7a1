//! Theme modifier Shopify app.
//!
//! Serves storefront SDK content (directly over CORS and through the app
//! proxy), installs into shops via OAuth, stores offline sessions and hands
//! tokens to the API tester. Exposed as a library for tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
