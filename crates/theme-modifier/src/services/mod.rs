//! Business logic services for the theme modifier.
//!
//! # Services
//!
//! - `api_tester` - Push freshly installed credentials to the API tester

pub mod api_tester;

pub use api_tester::{ApiTesterClient, RegistrationError};
