//! Shopify API tester library.
//!
//! Credential store, Admin GraphQL theme proxy and session sync, exposed as a
//! library so the binary, CLI and integration tests share one router.
//!
//! # Security
//!
//! The credential store holds Admin API tokens in plain text and the JSON API
//! has no authentication. Bind to localhost only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
