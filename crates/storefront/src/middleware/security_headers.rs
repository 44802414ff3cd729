//! Security headers for pages, API responses and uploaded media.
//!
//! Every response gets a locked-down baseline. Uploaded files are served from
//! our own origin, so the `/media` service additionally sandboxes them and
//! forces SVG (which can carry script) to download instead of render.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue, Response,
        header::{
            CONTENT_SECURITY_POLICY, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
};
use tower_http::services::fs::ServeFileSystemResponseBody;

/// Policy for server-rendered pages and the API.
///
/// ```text
/// default-src 'none'; script-src 'self'; style-src 'self';
/// img-src 'self'; connect-src 'self'; form-action 'self';
/// frame-ancestors 'none'; ...
/// ```
pub const PAGE_CSP: &str = "default-src 'none'; \
     script-src 'self'; \
     style-src 'self'; \
     font-src 'self'; \
     img-src 'self'; \
     connect-src 'self'; \
     frame-src 'none'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'";

/// Policy for uploaded files: no script, no plugins, opaque origin.
pub const MEDIA_CSP: &str = "sandbox; default-src 'none'; img-src 'self'; style-src 'unsafe-inline'";

const SVG_MIME: &str = "image/svg+xml";

/// Add security headers to all responses.
///
/// A `Content-Security-Policy` already set further in (the media service)
/// is left alone.
pub async fn security_headers_middleware(request: Request, next: Next) -> axum::response::Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    if !headers.contains_key(CONTENT_SECURITY_POLICY) {
        headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(PAGE_CSP));
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             display-capture=(), \
             geolocation=(), \
             microphone=(), \
             payment=(), \
             publickey-credentials-get=(), \
             usb=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

/// `Content-Disposition: attachment` for SVG files, nothing otherwise.
///
/// Used with `SetResponseHeaderLayer::if_not_present` on the media service.
pub fn svg_attachment(response: &Response<ServeFileSystemResponseBody>) -> Option<HeaderValue> {
    let is_svg = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(SVG_MIME));
    is_svg.then(|| HeaderValue::from_static("attachment"))
}
