//! TMDB response types.
//!
//! Only the fields the site uses are modelled. TMDB is inconsistent about
//! `null` versus missing fields, so optional data is deserialized leniently.

use reelcart_core::{GenreId, MovieId};
use serde::Deserialize;

/// `GET /search/movie` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieResult>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

const fn first_page() -> u32 {
    1
}

/// A single movie in a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieResult {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
}

impl MovieResult {
    /// Title shown to users: the original title, falling back to the
    /// localized one when TMDB leaves it blank.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.original_title.is_empty() {
            &self.title
        } else {
            &self.original_title
        }
    }
}

/// `GET /configuration` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationResponse {
    pub images: ImagesConfiguration,
}

/// Image hosting details from the TMDB configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfiguration {
    pub base_url: String,
    pub secure_base_url: String,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
}

/// `GET /genre/movie/list` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<Genre>,
}

/// A TMDB genre.
#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Error body TMDB sends with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub status_message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserializes() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "adult": false,
                    "id": 75780,
                    "original_title": "Jack Reacher",
                    "title": "Jack Reacher",
                    "poster_path": "/zlyhKMi2aLk25nOHnNm43MpZMtQ.jpg",
                    "vote_average": 6.6,
                    "release_date": "2012-12-20",
                    "overview": "One morning in Pittsburgh...",
                    "genre_ids": [80, 18, 53, 28]
                },
                {
                    "id": 1,
                    "original_title": "",
                    "title": "Untitled",
                    "poster_path": null,
                    "overview": null,
                    "genre_ids": []
                }
            ],
            "total_pages": 3,
            "total_results": 41
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.total_results, 41);
        assert_eq!(response.results.len(), 2);

        let reacher = &response.results[0];
        assert_eq!(reacher.id, MovieId::new(75780));
        assert_eq!(reacher.display_title(), "Jack Reacher");
        assert_eq!(reacher.genre_ids.len(), 4);
        assert_eq!(reacher.release_date.as_deref(), Some("2012-12-20"));

        let untitled = &response.results[1];
        assert!(untitled.poster_path.is_none());
        assert!(untitled.overview.is_none());
        assert!(untitled.release_date.is_none());
        assert!((untitled.vote_average - 0.0).abs() < f64::EPSILON);
        assert_eq!(untitled.display_title(), "Untitled");
    }

    #[test]
    fn test_empty_search_response_defaults() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.page, 1);
        assert!(response.results.is_empty());
        assert_eq!(response.total_pages, 0);
    }

    #[test]
    fn test_configuration_deserializes() {
        let json = r#"{
            "images": {
                "base_url": "http://image.tmdb.org/t/p/",
                "secure_base_url": "https://image.tmdb.org/t/p/",
                "poster_sizes": ["w92", "w154", "w185", "w342", "w500", "w780", "original"]
            },
            "change_keys": ["adult"]
        }"#;

        let config: ConfigurationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(config.images.secure_base_url, "https://image.tmdb.org/t/p/");
        assert!(config.images.poster_sizes.contains(&"w342".to_string()));
    }

    #[test]
    fn test_genre_list_deserializes() {
        let json = r#"{"genres": [{"id": 28, "name": "Action"}, {"id": 18, "name": "Drama"}]}"#;
        let list: GenreListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(list.genres.len(), 2);
        assert_eq!(list.genres[0].id, GenreId::new(28));
        assert_eq!(list.genres[1].name, "Drama");
    }
}
