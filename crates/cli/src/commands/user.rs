//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! reelcart-cli user create -u movie_fan -p 'a long password' --first-name Jack
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use thiserror::Error;

use reelcart_storefront::services::auth::{AuthError, AuthService, Registration};

use super::DatabaseError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Fields for a new user.
pub struct NewUserArgs<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Create a user with the same validation as the registration form.
///
/// # Errors
///
/// Returns `UserError` if the database is unreachable, the username or
/// password is rejected, or the username is taken.
pub async fn create(args: NewUserArgs<'_>) -> Result<(), UserError> {
    let pool = super::connect().await?;

    let user = AuthService::new(&pool)
        .register(Registration {
            username: args.username,
            password: args.password,
            first_name: args.first_name.unwrap_or_default(),
            last_name: args.last_name.unwrap_or_default(),
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    Ok(())
}
