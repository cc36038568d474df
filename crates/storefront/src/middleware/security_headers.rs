//! Security headers for every response.
//!
//! The site only renders its own HTML, CSS and `cart.js`, plus poster images
//! from TMDB's image host, so the policy allows exactly that. Pages are
//! per-user and never cached; `/static` assets are.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

const CSP: &str = "default-src 'none'; \
                   script-src 'self'; \
                   style-src 'self'; \
                   img-src 'self' https://image.tmdb.org; \
                   connect-src 'self'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

/// Browser features none of the pages use.
const PERMISSIONS_POLICY: &str =
    "camera=(), microphone=(), geolocation=(), payment=(), browsing-topics=()";

const PAGE_CACHE_CONTROL: &str = "no-store";
const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

/// Add security and caching headers to all responses.
///
/// Posters load cross-origin without a CORP header, hence
/// `Cross-Origin-Embedder-Policy: credentialless` rather than `require-corp`.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_static = request.uri().path().starts_with("/static/");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static(if is_static {
            STATIC_CACHE_CONTROL
        } else {
            PAGE_CACHE_CONTROL
        }),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    async fn headers_for(uri: &str) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/index", get(|| async { "ok" }))
            .route("/static/css/main.css", get(|| async { "body {}" }))
            .layer(axum::middleware::from_fn(security_headers_middleware));

        app.oneshot(
            axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .headers()
        .clone()
    }

    #[tokio::test]
    async fn test_page_headers() {
        let headers = headers_for("/index").await;
        assert_eq!(headers.get(X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-store");

        let csp = headers
            .get(CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(csp.contains("img-src 'self' https://image.tmdb.org"));
        assert!(csp.contains("script-src 'self'"));
        assert!(!csp.contains("unsafe-inline"));

        assert_eq!(
            headers.get("cross-origin-embedder-policy").unwrap(),
            "credentialless"
        );
    }

    #[tokio::test]
    async fn test_static_assets_are_cacheable() {
        let headers = headers_for("/static/css/main.css").await;
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), STATIC_CACHE_CONTROL);
        assert!(headers.get(CONTENT_SECURITY_POLICY).is_some());
    }
}
