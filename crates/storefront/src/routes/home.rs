//! Main page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::{CartRepository, MovieRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::models::movie::MovieRecord;
use crate::state::AppState;

/// Number of movies listed on the main page.
const TOP_RATED_LIMIT: i64 = 10;

/// Main page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: CurrentUser,
    pub cart_count: i64,
    pub movies: Vec<MovieRecord>,
}

/// Display the main page: the ten best rated movies anyone has added to a cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let movies = MovieRepository::new(state.pool())
        .top_rated(TOP_RATED_LIMIT)
        .await?;
    let cart_count = CartRepository::new(state.pool()).count(user.id).await?;

    Ok(IndexTemplate {
        user,
        cart_count,
        movies,
    })
}
