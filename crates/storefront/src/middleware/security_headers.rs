//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The policy starts
//! locked down and opens only the holes the Mercado Pago checkout widget
//! needs.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: same-origin` - No referrer leakage to third parties
/// - `Content-Security-Policy` - Allowlists the payment gateway (see below)
/// - `Permissions-Policy` - Deny sensitive device features
/// - `Cache-Control: no-store, max-age=0` - Cart and account pages vary per
///   session, so responses are not cacheable
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - The checkout
///   widget may open the gateway in a popup
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
///
/// # CSP Policy
///
/// The checkout page loads the Mercado Pago JS SDK and renders its widget,
/// which pulls assets from `mlstatic.com` and frames the gateway. Page
/// scripts (cart AJAX, checkout) are inline in the templates, so
/// `script-src` keeps `'unsafe-inline'`.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent clickjacking
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // Prevent MIME sniffing
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    // Full URL stays within the origin, nothing leaks to the gateway
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline' https://sdk.mercadopago.com https://http2.mlstatic.com; \
             style-src 'self' 'unsafe-inline'; \
             font-src 'self'; \
             img-src 'self' data: https:; \
             connect-src 'self' https://api.mercadopago.com; \
             frame-src https://*.mercadopago.com https://*.mercadopago.com.co https://*.mercadolibre.com; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'; \
             upgrade-insecure-requests",
        ),
    );

    // Deny device features the store never uses
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             serial=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Cart, checkout and account responses vary per session
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    // allow-popups: the gateway widget may open its checkout in a popup
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // No COEP: the gateway SDK and its frames do not send CORP headers

    // Prevent DNS prefetching to avoid leaking which links user hovers over
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
