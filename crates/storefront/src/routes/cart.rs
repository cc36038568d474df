//! Cart route handlers.
//!
//! `/updateCart` is called from the search page (via `static/js/cart.js`) and
//! from the cart page's remove links. It answers with the cart-count fragment,
//! or with a redirect when the caller passes a local `redirect` path.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use reelcart_core::MovieId;

use crate::db::{CartRepository, MovieRepository, RepositoryError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::models::movie::{CartItem, MovieRecord, parse_release_date};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// What `/updateCart` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add,
    Delete,
}

impl CartAction {
    /// Parse the `action` query parameter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "add" => Some(Self::Add),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// `/updateCart` query parameters.
///
/// Everything is taken as a string so malformed input becomes a 400 with a
/// readable message instead of a generic extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCartQuery {
    pub action: Option<String>,
    pub movie_id: Option<String>,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<String>,
    pub genres: Option<String>,
    pub redirect: Option<String>,
}

impl UpdateCartQuery {
    fn action(&self) -> Result<CartAction, AppError> {
        let value = self
            .action
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("missing action".to_string()))?;
        CartAction::parse(value)
            .ok_or_else(|| AppError::BadRequest(format!("unknown action '{value}'")))
    }

    fn movie_id(&self) -> Result<MovieId, AppError> {
        let value = self
            .movie_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing movie_id".to_string()))?;

        value
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(MovieId::new)
            .ok_or_else(|| AppError::BadRequest(format!("invalid movie_id '{value}'")))
    }

    /// Build the movie to store for an `add`.
    fn movie(&self, id: MovieId) -> Result<MovieRecord, AppError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing title".to_string()))?;

        let rating = match self.rating.as_deref().map(str::trim) {
            None | Some("") => 0.0,
            Some(value) => value
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && (0.0..=10.0).contains(r))
                .ok_or_else(|| AppError::BadRequest(format!("invalid rating '{value}'")))?,
        };

        Ok(MovieRecord {
            id,
            title: title.to_string(),
            release_date: self.release_date.as_deref().and_then(parse_release_date),
            description: self.description.clone().unwrap_or_default(),
            image_url: self.image_url.as_deref().and_then(image_url),
            rating,
            genres: parse_genres(self.genres.as_deref().unwrap_or_default()),
        })
    }

    fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref().and_then(safe_redirect)
    }
}

/// Split a comma-separated genre list, dropping blanks.
#[must_use]
pub fn parse_genres(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect()
}

/// Accept a redirect target only if it is a path on this site.
#[must_use]
pub fn safe_redirect(target: &str) -> Option<&str> {
    let is_local = target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control);
    is_local.then_some(target)
}

/// A cart row whose user or movie vanished mid-request is a 404.
fn add_error(error: RepositoryError, movie_id: MovieId) -> AppError {
    match error {
        RepositoryError::NotFound => AppError::NotFound(format!("movie {movie_id}")),
        other => other.into(),
    }
}

/// Keep only absolute http(s) poster URLs.
fn image_url(value: &str) -> Option<String> {
    let url = Url::parse(value.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub user: CurrentUser,
    pub cart_count: i64,
    pub items: Vec<CartItem>,
}

/// Cart count fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub cart_count: i64,
}

// =============================================================================
// Routes
// =============================================================================

/// Add a movie to, or remove it from, the signed-in user's cart.
#[instrument(skip_all, fields(user_id = %user.id, action = ?query.action, movie_id = ?query.movie_id))]
pub async fn update_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<UpdateCartQuery>,
) -> Result<Response, AppError> {
    let action = query.action()?;
    let movie_id = query.movie_id()?;
    let cart = CartRepository::new(state.pool());
    let id = movie_id.to_string();

    match action {
        CartAction::Add => {
            let movie = query.movie(movie_id)?;
            MovieRepository::new(state.pool()).upsert(&movie).await?;
            cart.add(user.id, movie_id)
                .await
                .map_err(|e| add_error(e, movie_id))?;
            add_breadcrumb(
                "cart",
                "Added movie",
                Some(&[("movie_id", id.as_str())]),
            );
            tracing::info!("Movie added to cart");
        }
        CartAction::Delete => {
            let removed = cart.remove(user.id, movie_id).await?;
            add_breadcrumb(
                "cart",
                "Removed movie",
                Some(&[("movie_id", id.as_str())]),
            );
            tracing::info!(removed, "Movie removed from cart");
        }
    }

    if let Some(target) = query.redirect() {
        return Ok(Redirect::to(target).into_response());
    }

    let cart_count = cart.count(user.id).await?;
    Ok(CartCountTemplate { cart_count }.into_response())
}

/// Display the signed-in user's cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let items = CartRepository::new(state.pool()).items(user.id).await?;
    let cart_count = i64::try_from(items.len()).unwrap_or(i64::MAX);

    Ok(CartTemplate {
        user,
        cart_count,
        items,
    })
}
