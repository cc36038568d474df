//! Movie repository.
//!
//! Movies are copied from TMDB into `reelcart.movie` when someone adds them to
//! a cart. Genres are stored by name and linked through `reelcart.movie_genre`.

use chrono::NaiveDate;
use sqlx::PgPool;

use reelcart_core::MovieId;

use super::RepositoryError;
use crate::models::movie::MovieRecord;

/// Row shape shared by every query that returns movies with their genres.
#[derive(sqlx::FromRow)]
pub(super) struct MovieRow {
    pub(super) movie_id: i32,
    pub(super) title: String,
    pub(super) release_date: Option<NaiveDate>,
    pub(super) description: String,
    pub(super) image_url: Option<String>,
    pub(super) rating: f64,
    pub(super) genres: Vec<String>,
}

impl From<MovieRow> for MovieRecord {
    fn from(row: MovieRow) -> Self {
        Self {
            id: MovieId::new(row.movie_id),
            title: row.title,
            release_date: row.release_date,
            description: row.description,
            image_url: row.image_url,
            rating: row.rating,
            genres: row.genres,
        }
    }
}

/// Aggregates a movie's genre names, alphabetically, as `genres`.
///
/// Expects `m` to alias `reelcart.movie` and the query to group by `m.movie_id`.
pub(super) const GENRES_COLUMN: &str = "COALESCE(\
     array_agg(g.name ORDER BY g.name) FILTER (WHERE g.name IS NOT NULL), \
     '{}'::text[]) AS genres";

/// Joins that make `g.name` available to [`GENRES_COLUMN`].
pub(super) const GENRE_JOINS: &str = "\
     LEFT JOIN reelcart.movie_genre mg ON mg.movie_id = m.movie_id \
     LEFT JOIN reelcart.genre g ON g.genre_id = mg.genre_id";

/// Repository for movie database operations.
pub struct MovieRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MovieRepository<'a> {
    /// Create a new movie repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a movie and replace its genre links.
    ///
    /// Runs in one transaction. Genre names are created on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn upsert(&self, movie: &MovieRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO reelcart.movie
                (movie_id, title, release_date, description, image_url, rating)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (movie_id) DO UPDATE SET
                title = EXCLUDED.title,
                release_date = EXCLUDED.release_date,
                description = EXCLUDED.description,
                image_url = EXCLUDED.image_url,
                rating = EXCLUDED.rating,
                updated_at = NOW()
            ",
        )
        .bind(movie.id.as_i32())
        .bind(&movie.title)
        .bind(movie.release_date)
        .bind(&movie.description)
        .bind(movie.image_url.as_deref())
        .bind(movie.rating)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM reelcart.movie_genre WHERE movie_id = $1")
            .bind(movie.id.as_i32())
            .execute(&mut *tx)
            .await?;

        let genres = normalize_genres(&movie.genres);
        if !genres.is_empty() {
            sqlx::query(
                r"
                INSERT INTO reelcart.genre (name)
                SELECT UNNEST($1::text[])
                ON CONFLICT (name) DO NOTHING
                ",
            )
            .bind(&genres)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r"
                INSERT INTO reelcart.movie_genre (movie_id, genre_id)
                SELECT $1, genre_id FROM reelcart.genre WHERE name = ANY($2)
                ",
            )
            .bind(movie.id.as_i32())
            .bind(&genres)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(movie_id = %movie.id, genres = genres.len(), "Upserted movie");
        Ok(())
    }

    /// The highest rated stored movies, best first (ties by title).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<MovieRecord>, RepositoryError> {
        let sql = format!(
            "SELECT m.movie_id, m.title, m.release_date, m.description, m.image_url, m.rating, \
                    {GENRES_COLUMN} \
             FROM reelcart.movie m {GENRE_JOINS} \
             GROUP BY m.movie_id \
             ORDER BY m.rating DESC, m.title ASC \
             LIMIT $1"
        );

        let rows: Vec<MovieRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(MovieRecord::from).collect())
    }
}

/// Trim genre names, drop blanks and duplicates, keep first-seen order.
fn normalize_genres(genres: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for name in genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
        if !out.iter().any(|existing| existing == name) {
            out.push(name.to_string());
        }
    }
    out
}
