//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use reelcart_core::{UserId, Username};

/// A site user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Sign-in name.
    pub username: Username,
    /// First name given at registration.
    pub first_name: Option<String>,
    /// Last name given at registration.
    pub last_name: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
