//! User repository for database operations.
//!
//! Rows are decoded into private row structs and then validated into domain
//! types, so a bad value in the table surfaces as `DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use reelcart_core::{UserId, Username};

use super::RepositoryError;
use crate::models::user::{NewUser, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i32,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.user_id),
            username,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO reelcart.user (username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, username, first_name, last_name, created_at
            ",
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.first_name.as_deref())
        .bind(new_user.last_name.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username already exists"))?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT user_id, username, first_name, last_name, created_at
            FROM reelcart.user
            WHERE user_id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// Returns `None` if no user has this username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_credentials_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialsRow> = sqlx::query_as(
            r"
            SELECT user_id, username, first_name, last_name, created_at, password_hash
            FROM reelcart.user
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash = row.password_hash;
        let user = User::try_from(row.user)?;
        Ok(Some((user, password_hash)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(username: &str) -> UserRow {
        UserRow {
            user_id: 7,
            username: username.to_string(),
            first_name: Some("Jack".to_string()),
            last_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_user() {
        let user = User::try_from(row("jreacher")).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.username.as_str(), "jreacher");
        assert_eq!(user.first_name.as_deref(), Some("Jack"));
    }

    #[test]
    fn test_invalid_username_is_data_corruption() {
        let err = User::try_from(row("not valid")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
