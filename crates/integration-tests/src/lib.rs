//! Integration tests for ReelCart.
//!
//! These tests drive a running site over HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate a database and start the site
//! cargo run -p reelcart-cli -- migrate
//! cargo run -p reelcart-storefront
//!
//! # Run the ignored integration tests against it
//! SITE_BASE_URL=http://127.0.0.1:3000 cargo test -p reelcart-integration-tests -- --ignored
//! ```

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use uuid::Uuid;

/// Password used for every account the tests create.
pub const TEST_PASSWORD: &str = "integration-password";

/// Base URL of the site under test (`SITE_BASE_URL`, default `http://127.0.0.1:3000`).
#[must_use]
pub fn site_base_url() -> String {
    std::env::var("SITE_BASE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A fresh address in the 198.18.0.0/15 benchmarking range.
///
/// The site rate-limits the sign-in and registration forms per client
/// address. Every test client presents its own address so parallel tests do
/// not share one budget.
#[must_use]
pub fn unique_client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("198.{}.{b}.{c}", 18 + (a & 1))
}

fn client_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&unique_client_ip()).expect("IP address is a valid header value"),
    );
    headers
}

/// A client that keeps cookies and follows redirects.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .default_headers(client_headers())
        .build()
        .expect("Failed to create HTTP client")
}

/// A client that keeps cookies but reports redirects instead of following them.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn non_following_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .default_headers(client_headers())
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A username no earlier run has used.
#[must_use]
pub fn unique_username() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("it_{}", id.get(..20).unwrap_or(&id))
}

/// Register a fresh account and sign in with `client`.
///
/// Returns the username.
///
/// # Panics
///
/// Panics if the site is unreachable or either step fails.
pub async fn register_and_sign_in(client: &Client) -> String {
    let base_url = site_base_url();
    let username = unique_username();

    let resp = client
        .post(format!("{base_url}/register"))
        .form(&[
            ("username", username.as_str()),
            ("password", TEST_PASSWORD),
            ("firstName", "Integration"),
            ("lastName", "Test"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert!(
        resp.status().is_success() || resp.status().is_redirection(),
        "register returned {}",
        resp.status()
    );

    let resp = client
        .post(format!("{base_url}/signIn"))
        .form(&[("username", username.as_str()), ("password", TEST_PASSWORD)])
        .send()
        .await
        .expect("Failed to sign in");
    assert!(
        resp.status().is_success() || resp.status().is_redirection(),
        "sign-in returned {}",
        resp.status()
    );

    username
}
