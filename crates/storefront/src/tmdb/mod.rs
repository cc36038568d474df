//! TMDB (The Movie Database) v3 API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; the API key travels as the `api_key` query parameter
//! - TMDB is the source of truth for search results; nothing is synced locally
//!   until a user adds a movie to their cart
//! - Search pages are cached in memory via `moka` (5 minute TTL)
//! - The image configuration and genre list ("API metadata") are held in a
//!   [`MetadataStore`] and refreshed on a fixed interval by a background task
//!
//! # Example
//!
//! ```rust,ignore
//! use reelcart_storefront::tmdb::{MetadataStore, TmdbClient};
//!
//! let client = TmdbClient::new(&config.tmdb)?;
//! let metadata = MetadataStore::new(client.clone());
//! metadata.spawn_refresh(config.tmdb.refresh_interval);
//!
//! let page = client.search_movies("Jack Reacher", 1).await?;
//! let meta = metadata.get_or_load().await?;
//! let genres = meta.genre_names(&page.results[0].genre_ids);
//! ```

mod cache;
mod client;
pub(crate) mod metadata;
pub mod types;

pub use client::TmdbClient;
pub use metadata::{ApiMetadata, MetadataStore, POSTER_SIZE};

use thiserror::Error;

/// Errors that can occur when interacting with the TMDB API.
#[derive(Debug, Error)]
pub enum TmdbError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TMDB answered with a non-success status code.
    #[error("TMDB returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body or TMDB `status_message`.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by TMDB.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = TmdbError::Status {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "TMDB returned HTTP 401: Invalid API key");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = TmdbError::RateLimited(10);
        assert_eq!(err.to_string(), "Rate limited, retry after 10 seconds");
    }
}
