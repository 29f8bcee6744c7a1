//! Security headers for the theme modifier.
//!
//! Unlike a standalone site this app is framed by the Shopify admin and its
//! SDK script and content are fetched from storefront origins, so framing is
//! limited to Shopify and resources are shareable cross-origin.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy: frame-ancestors` limited to the Shopify admin
///   and `*.myshopify.com`
/// - `Cross-Origin-Resource-Policy: cross-origin` so storefronts can load
///   `/static/sdk.js`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "frame-ancestors https://admin.shopify.com https://*.myshopify.com",
        ),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );

    response
}
