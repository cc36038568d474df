//! Movie search handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::db::CartRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::models::movie::SearchPage;
use crate::state::AppState;

/// Highest page TMDB will serve for a search.
const MAX_PAGE: u32 = 500;

/// Deserialize empty strings as None for the optional page number.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search_string: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
}

impl SearchQuery {
    /// The trimmed search text.
    fn text(&self) -> &str {
        self.search_string.trim()
    }

    /// Requested page, clamped to what TMDB serves.
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "selection.html")]
pub struct SelectionTemplate {
    pub user: CurrentUser,
    pub cart_count: i64,
    pub results: SearchPage,
    /// False when the query was blank and no search ran.
    pub searched: bool,
}

/// Search TMDB and render a page of results.
///
/// A blank query renders the page without calling TMDB.
#[instrument(skip_all, fields(user_id = %user.id, query = %query.text(), page = query.page()))]
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cart_count = CartRepository::new(state.pool()).count(user.id).await?;
    let text = query.text();

    if text.is_empty() {
        return Ok(SelectionTemplate {
            user,
            cart_count,
            results: SearchPage::empty(text),
            searched: false,
        });
    }

    let metadata = state.metadata().get_or_load().await?;
    let response = state.tmdb().search_movies(text, query.page()).await?;
    let results = SearchPage::from_response(text, &response, &metadata);

    tracing::debug!(
        results = results.movies.len(),
        total_results = results.total_results,
        "Search rendered"
    );

    Ok(SelectionTemplate {
        user,
        cart_count,
        results,
        searched: true,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(query: &str) -> SearchQuery {
        let uri: axum::http::Uri = format!("/search?{query}").parse().unwrap();
        Query::<SearchQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_search_query_defaults() {
        let query = parse("");
        assert_eq!(query.text(), "");
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_search_query_trims_text() {
        let query = parse("search_string=%20%20jack%20reacher%20&page=2");
        assert_eq!(query.text(), "jack reacher");
        assert_eq!(query.page(), 2);
    }

    #[test]
    fn test_search_query_empty_page() {
        assert_eq!(parse("search_string=x&page=").page(), 1);
    }

    #[test]
    fn test_search_query_clamps_page() {
        assert_eq!(parse("search_string=x&page=0").page(), 1);
        assert_eq!(parse("search_string=x&page=9999").page(), MAX_PAGE);
    }

    #[test]
    fn test_search_query_rejects_non_numeric_page() {
        let uri: axum::http::Uri = "/search?search_string=x&page=two".parse().unwrap();
        assert!(Query::<SearchQuery>::try_from_uri(&uri).is_err());
    }
}
