//! Movie domain types.
//!
//! [`MovieSummary`] is what the search page shows for a TMDB result;
//! [`MovieRecord`] is a movie as stored locally once someone adds it to a cart.

use chrono::{DateTime, NaiveDate, Utc};

use reelcart_core::MovieId;

use crate::tmdb::ApiMetadata;
use crate::tmdb::types::{MovieResult, SearchResponse};

/// Shown when a release date is missing or unparsable.
const UNKNOWN_DATE: &str = "Unknown";

/// Parse a TMDB release date (`YYYY-MM-DD`).
#[must_use]
pub fn parse_release_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Format a date for display as `M/D/YYYY`.
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || UNKNOWN_DATE.to_string(),
        |d| d.format("%-m/%-d/%Y").to_string(),
    )
}

/// Format a TMDB rating with one decimal.
#[must_use]
pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

// =============================================================================
// Search results
// =============================================================================

/// A search result prepared for display.
#[derive(Debug, Clone)]
pub struct MovieSummary {
    pub movie_id: MovieId,
    pub title: String,
    pub image_url: Option<String>,
    pub rating: f64,
    /// Display date (`M/D/YYYY` or `Unknown`).
    pub release_date: String,
    /// ISO date as TMDB sent it, empty when absent.
    pub release_date_iso: String,
    pub overview: String,
    pub genres: Vec<String>,
}

impl MovieSummary {
    /// Combine a TMDB result with the current metadata snapshot.
    #[must_use]
    pub fn from_result(result: &MovieResult, metadata: &ApiMetadata) -> Self {
        let release_date_iso = result.release_date.clone().unwrap_or_default();

        Self {
            movie_id: result.id,
            title: result.display_title().to_string(),
            image_url: metadata.poster_url(result.poster_path.as_deref()),
            rating: result.vote_average,
            release_date: format_date(parse_release_date(&release_date_iso)),
            release_date_iso,
            overview: result.overview.clone().unwrap_or_default(),
            genres: metadata.genre_names(&result.genre_ids),
        }
    }

    #[must_use]
    pub fn rating_display(&self) -> String {
        format_rating(self.rating)
    }

    #[must_use]
    pub fn genres_display(&self) -> String {
        self.genres.join(", ")
    }

    /// `/updateCart` URL that adds this movie to the cart.
    #[must_use]
    pub fn add_to_cart_url(&self) -> String {
        let image_url = self.image_url.clone().unwrap_or_default();
        let params = [
            ("action", "add".to_string()),
            ("movie_id", self.movie_id.to_string()),
            ("title", self.title.clone()),
            ("release_date", self.release_date_iso.clone()),
            ("description", self.overview.clone()),
            ("image_url", image_url),
            ("rating", self.rating.to_string()),
            ("genres", self.genres.join(",")),
        ];

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("/updateCart?{query}")
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub query: String,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub movies: Vec<MovieSummary>,
}

impl SearchPage {
    /// An empty page for `query` (no search performed).
    #[must_use]
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            page: 1,
            ..Self::default()
        }
    }

    /// Build a page from a TMDB response.
    #[must_use]
    pub fn from_response(query: &str, response: &SearchResponse, metadata: &ApiMetadata) -> Self {
        Self {
            query: query.to_string(),
            page: response.page.max(1),
            total_pages: response.total_pages,
            total_results: response.total_results,
            movies: response
                .results
                .iter()
                .map(|result| MovieSummary::from_result(result, metadata))
                .collect(),
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub fn previous_url(&self) -> String {
        self.page_url(self.page.saturating_sub(1).max(1))
    }

    #[must_use]
    pub fn next_url(&self) -> String {
        self.page_url(self.page.saturating_add(1))
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "/search?search_string={}&page={page}",
            urlencoding::encode(&self.query)
        )
    }
}

// =============================================================================
// Stored movies and cart
// =============================================================================

/// A movie as stored in the local database.
#[derive(Debug, Clone)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub description: String,
    pub image_url: Option<String>,
    pub rating: f64,
    pub genres: Vec<String>,
}

impl MovieRecord {
    #[must_use]
    pub fn release_date_display(&self) -> String {
        format_date(self.release_date)
    }

    #[must_use]
    pub fn rating_display(&self) -> String {
        format_rating(self.rating)
    }

    #[must_use]
    pub fn genres_display(&self) -> String {
        self.genres.join(", ")
    }
}

/// A movie in a user's cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub movie: MovieRecord,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// `/updateCart` URL that removes this movie and returns to the cart page.
    #[must_use]
    pub fn remove_url(&self) -> String {
        format!(
            "/updateCart?action=delete&movie_id={}&redirect={}",
            self.movie.id,
            urlencoding::encode("/shoppingCart")
        )
    }
}
