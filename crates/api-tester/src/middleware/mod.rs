//! HTTP middleware stack for the API tester.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (dashboard CSP)
//!
//! The `X-Store-Id` extractor lives here too; every Shopify proxy handler
//! takes it as its first argument.

pub mod request_id;
pub mod security_headers;
pub mod store_id;

pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use store_id::{STORE_ID_HEADER, StoreIdHeader};
