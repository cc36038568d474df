//! TMDB API client implementation.
//!
//! Uses `reqwest` for HTTP. Caches search pages using `moka` (5-minute TTL).
//! Failures are logged and returned to the caller; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::TmdbConfig;

use super::TmdbError;
use super::cache::SearchCacheKey;
use super::types::{ConfigurationResponse, ErrorResponse, GenreListResponse, SearchResponse};

/// Per-request timeout for TMDB calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of characters of an error body kept for logs.
const ERROR_BODY_LIMIT: usize = 500;

// =============================================================================
// TmdbClient
// =============================================================================

/// Client for the TMDB v3 API.
///
/// Cheap to clone; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct TmdbClient {
    inner: Arc<TmdbClientInner>,
}

struct TmdbClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    search_cache: Cache<SearchCacheKey, SearchResponse>,
}

impl TmdbClient {
    /// Create a new TMDB API client.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::Http` if the HTTP client fails to build.
    pub fn new(config: &TmdbConfig) -> Result<Self, TmdbError> {
        let search_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("reelcart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(TmdbClientInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                search_cache,
            }),
        })
    }

    /// Execute a GET request against `path` and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let url = format!("{}{path}", self.inner.base_url);

        let response = self
            .inner
            .client
            .get(&url)
            .query(&[("api_key", self.inner.api_key.expose_secret())])
            .query(params)
            .send()
            .await
            // The URL carries the API key; keep it out of error messages
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            tracing::warn!(path, retry_after, "TMDB rate limit hit");
            return Err(TmdbError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!(
                path,
                status = %status,
                body = %message,
                "TMDB returned non-success status"
            );
            return Err(TmdbError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                path,
                error = %e,
                body = %truncate(&body),
                "Failed to parse TMDB response"
            );
            TmdbError::Parse(e)
        })
    }

    /// Fetch the API configuration (image base URLs and sizes).
    ///
    /// # Errors
    ///
    /// Returns `TmdbError` if the request or decoding fails.
    #[instrument(skip(self))]
    pub async fn configuration(&self) -> Result<ConfigurationResponse, TmdbError> {
        self.get("/configuration", &[]).await
    }

    /// Fetch the list of movie genres.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError` if the request or decoding fails.
    #[instrument(skip(self))]
    pub async fn movie_genres(&self) -> Result<GenreListResponse, TmdbError> {
        self.get("/genre/movie/list", &[]).await
    }

    /// Search movies by title.
    ///
    /// `page` is 1-based. Results are cached per normalized query and page.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError` if the request or decoding fails.
    #[instrument(skip(self))]
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<SearchResponse, TmdbError> {
        let key = SearchCacheKey::new(query, page);

        if let Some(cached) = self.inner.search_cache.get(&key).await {
            debug!("Search cache hit");
            return Ok(cached);
        }

        let response: SearchResponse = self
            .get(
                "/search/movie",
                &[("query", query.trim().to_string()), ("page", page.to_string())],
            )
            .await?;

        debug!(
            results = response.results.len(),
            total_results = response.total_results,
            "Search completed"
        );

        self.inner.search_cache.insert(key, response.clone()).await;
        Ok(response)
    }
}

/// Extract a readable message from a TMDB error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| truncate(body), |e| e.status_message)
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_status_message() {
        let body = r#"{"status_code": 7, "status_message": "Invalid API key: You must be granted a valid key.", "success": false}"#;
        assert_eq!(
            error_message(body),
            "Invalid API key: You must be granted a valid key."
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("<html>Bad Gateway</html>"), "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_truncate_limits_length() {
        let body = "x".repeat(2 * ERROR_BODY_LIMIT);
        assert_eq!(truncate(&body).len(), ERROR_BODY_LIMIT);
    }
}
