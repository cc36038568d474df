//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /               - Sign-in and registration page
//! POST /signIn         - Sign-in form (rate limited)
//! POST /register       - Registration form (rate limited)
//! GET  /logout         - Sign out
//!
//! # Requires sign-in
//! GET  /index          - Top rated movies
//! GET  /search         - TMDB search results (?search_string=&page=)
//! GET  /updateCart     - Add/remove a movie (?action=add|delete&movie_id=...)
//! GET  /shoppingCart   - Cart page
//! ```
//!
//! Health checks and `/static` are mounted by the binary.

pub mod auth;
pub mod cart;
pub mod home;
pub mod search;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, reject_cross_site};
use crate::state::AppState;

/// Create the sign-in and registration form routes.
pub fn auth_form_routes() -> Router<AppState> {
    Router::new()
        .route("/signIn", post(auth::sign_in))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter())
}

/// Create all page routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::sign_in_page))
        .route("/index", get(home::index))
        .route("/search", get(search::search))
        .route("/logout", get(auth::logout))
        .route(
            "/updateCart",
            get(cart::update_cart).layer(from_fn(reject_cross_site)),
        )
        .route("/shoppingCart", get(cart::show))
        .merge(auth_form_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::{DEFAULT_TMDB_BASE_URL, SiteConfig, TmdbConfig};
    use crate::middleware::session::session_layer;

    // Nothing listens on the discard port, so any query fails fast
    const DATABASE_URL: &str = "postgres://reelcart@127.0.0.1:9/reelcart_test";

    fn app() -> Router {
        app_with_store(MemoryStore::default())
    }

    fn app_with_store(store: MemoryStore) -> Router {
        let config = SiteConfig {
            database_url: SecretString::from(DATABASE_URL),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://127.0.0.1:3000".to_string(),
            tmdb: TmdbConfig {
                base_url: DEFAULT_TMDB_BASE_URL.to_string(),
                api_key: SecretString::from("test-key"),
                refresh_interval: Duration::from_secs(60),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        // Never connects unless a handler reaches the database
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(DATABASE_URL)
            .unwrap();
        let state = AppState::new(config, pool).unwrap();

        routes()
            .layer(session_layer(store, false))
            .with_state(state)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_page_renders() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("action=\"/signIn\""));
        assert!(body.contains("action=\"/register\""));
    }

    #[tokio::test]
    async fn test_sign_in_page_shows_known_messages_only() {
        let response = app()
            .oneshot(get("/?error=username_taken"))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("already taken"));

        let response = app()
            .oneshot(get("/?error=%3Cscript%3Ealert(1)%3C%2Fscript%3E"))
            .await
            .unwrap();
        assert!(!body_text(response).await.contains("<script>alert"));
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_when_signed_out() {
        for uri in [
            "/index",
            "/search?search_string=reacher",
            "/shoppingCart",
            "/updateCart?action=add&movie_id=75780",
        ] {
            let response = app().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_logout_redirects_home() {
        let response = app().oneshot(get("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_sign_in_with_malformed_username_rerenders_page() {
        let response = app()
            .oneshot(post_form("/signIn", "username=&password=whatever"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_register_with_weak_password_redirects_with_error() {
        let response = app()
            .oneshot(post_form(
                "/register",
                "username=jreacher&password=short&firstName=Jack&lastName=Reacher",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?error=weak_password");
    }

    #[tokio::test]
    async fn test_register_with_invalid_username_redirects_with_error() {
        let response = app()
            .oneshot(post_form(
                "/register",
                "username=two+words&password=long+enough+password",
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/?error=invalid_username");
    }

    #[tokio::test]
    async fn test_register_with_missing_fields_redirects_with_error() {
        let response = app()
            .oneshot(post_form("/register", "firstName=Jack"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?error=invalid_username");

        let response = app()
            .oneshot(post_form("/register", "username=jreacher"))
            .await
            .unwrap();
        assert_eq!(location(&response), "/?error=weak_password");
    }

    #[tokio::test]
    async fn test_sign_in_with_missing_fields_rerenders_page() {
        let response = app().oneshot(post_form("/signIn", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_form_rate_limit_is_per_client_address() {
        let app = app();
        let register = |ip: &str| {
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("x-forwarded-for", ip)
                .body(Body::from("username=two+words&password=long+enough+password"))
                .unwrap()
        };

        let mut statuses = Vec::new();
        for _ in 0..6 {
            let response = app.clone().oneshot(register("198.51.100.1")).await.unwrap();
            statuses.push(response.status());
        }
        assert!(statuses.iter().take(5).all(|s| *s == StatusCode::SEE_OTHER));
        assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));

        // Another client still has its full burst
        let response = app.clone().oneshot(register("198.51.100.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_update_cart_refuses_cross_site_requests() {
        let request = Request::builder()
            .uri("/updateCart?action=delete&movie_id=75780")
            .header("sec-fetch-site", "cross-site")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .uri("/updateCart?action=delete&movie_id=75780")
            .header("sec-fetch-site", "same-origin")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_signed_in_user_lookup_failure_is_server_error() {
        let store = MemoryStore::default();
        let app = app_with_store(store.clone());

        // Sign in through a helper route sharing the same session store
        let sign_in = Router::new()
            .route(
                "/test-sign-in",
                axum::routing::get(|session: tower_sessions::Session| async move {
                    let user = crate::models::CurrentUser {
                        id: reelcart_core::UserId::new(1),
                        username: reelcart_core::Username::parse("jreacher").unwrap(),
                        first_name: None,
                    };
                    crate::middleware::set_current_user(&session, &user)
                        .await
                        .unwrap();
                    "signed in"
                }),
            )
            .layer(session_layer(store, false));
        let response = sign_in.oneshot(get("/test-sign-in")).await.unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        // The pool points at a closed port, so the user refresh fails
        let request = Request::builder()
            .uri("/index")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
