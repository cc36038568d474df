//! Fetch-metadata check for routes that change state over GET.
//!
//! `/updateCart` is a GET link, so `SameSite=Lax` cookies still ride along on
//! a cross-site navigation. Browsers label those requests with
//! `Sec-Fetch-Site: cross-site`; they are refused here. Clients that send no
//! fetch metadata are let through.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// The fetch-metadata header naming the request's origin relationship.
pub const SEC_FETCH_SITE: &str = "sec-fetch-site";

/// Middleware that refuses requests a browser marks as cross-site.
pub async fn reject_cross_site(request: Request, next: Next) -> Response {
    let cross_site = request
        .headers()
        .get(SEC_FETCH_SITE)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"cross-site"));

    if cross_site {
        tracing::warn!(uri = %request.uri(), "Refused cross-site request");
        return AppError::Forbidden("cross-site request".to_string()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/updateCart",
            get(|| async { "changed" }).layer(axum::middleware::from_fn(reject_cross_site)),
        )
    }

    async fn status(fetch_site: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri("/updateCart");
        if let Some(value) = fetch_site {
            request = request.header(SEC_FETCH_SITE, value);
        }
        app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_cross_site_is_forbidden() {
        assert_eq!(status(Some("cross-site")).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_same_origin_and_direct_requests_pass() {
        assert_eq!(status(Some("same-origin")).await, StatusCode::OK);
        assert_eq!(status(Some("none")).await, StatusCode::OK);
        assert_eq!(status(None).await, StatusCode::OK);
    }
}
