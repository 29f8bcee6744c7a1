//! Core types for the API tester workspace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod id;
pub mod session;
pub mod store_url;

pub use credential::{
    CredentialRegistration, NewStoreCredential, StoreCredential, StoreCredentialPatch,
    StoreCredentialDetail, StoreCredentialSummary, UpsertOutcome,
};
pub use id::{StoreCredentialId, StoreCredentialIdError};
pub use session::{SourceSession, preferred_sessions};
pub use store_url::{ShopDomain, ShopDomainError, StoreUrl, StoreUrlError};
