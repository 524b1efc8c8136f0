//! Security headers middleware.

use axum::{extract::Request, http::header::HeaderValue, middleware::Next, response::Response};

/// Headers added to every response.
///
/// Strict-Transport-Security belongs to the TLS-terminating proxy.
const SECURITY_HEADERS: [(&str, &str); 3] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "same-origin"),
];

/// Add security headers, and `Cache-Control: no-store` unless the handler
/// chose its own caching.
///
/// Pages carry session-specific content (flash messages, the unlocked
/// state of threads), so nothing is cacheable by default.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    if !headers.contains_key("Cache-Control") {
        headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    }

    response
}
