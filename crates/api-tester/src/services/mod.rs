//! Business logic services for the API tester.
//!
//! # Services
//!
//! - `sync` - Import OAuth sessions from the theme modifier's database

pub mod sync;
