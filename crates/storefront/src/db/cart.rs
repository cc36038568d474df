//! Cart repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use reelcart_core::{MovieId, UserId};

use super::RepositoryError;
use super::movies::{GENRE_JOINS, GENRES_COLUMN, MovieRow};
use crate::models::movie::{CartItem, MovieRecord};

#[derive(sqlx::FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    added_at: DateTime<Utc>,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Put a stored movie in a user's cart. Adding it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or movie does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(&self, user_id: UserId, movie_id: MovieId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO reelcart.cart (user_id, movie_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            ",
        )
        .bind(user_id.as_i32())
        .bind(movie_id.as_i32())
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Take a movie out of a user's cart.
    ///
    /// Returns `true` if the movie was in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, movie_id: MovieId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reelcart.cart WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id.as_i32())
            .bind(movie_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The movies in a user's cart, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let sql = format!(
            "SELECT m.movie_id, m.title, m.release_date, m.description, m.image_url, m.rating, \
                    {GENRES_COLUMN}, c.added_at \
             FROM reelcart.cart c \
             JOIN reelcart.movie m ON m.movie_id = c.movie_id \
             {GENRE_JOINS} \
             WHERE c.user_id = $1 \
             GROUP BY m.movie_id, c.added_at \
             ORDER BY c.added_at DESC, m.title ASC"
        );

        let rows: Vec<CartRow> = sqlx::query_as(&sql)
            .bind(user_id.as_i32())
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CartItem {
                movie: MovieRecord::from(row.movie),
                added_at: row.added_at,
            })
            .collect())
    }

    /// Number of movies in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reelcart.cart WHERE user_id = $1")
            .bind(user_id.as_i32())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
