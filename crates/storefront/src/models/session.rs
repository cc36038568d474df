//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use reelcart_core::{UserId, Username};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user. Its
/// presence in the session is what marks the session as authenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's sign-in name.
    pub username: Username,
    /// First name, if the user gave one at registration.
    pub first_name: Option<String>,
}

impl CurrentUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.username.as_str())
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_first_name() {
        let user = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("jreacher").unwrap(),
            first_name: Some("Jack".to_string()),
        };
        assert_eq!(user.display_name(), "Jack");
    }

    #[test]
    fn test_from_stored_user() {
        let user = User {
            id: UserId::new(3),
            username: Username::parse("jreacher").unwrap(),
            first_name: Some("Jack".to_string()),
            last_name: Some("Reacher".to_string()),
            created_at: chrono::Utc::now(),
        };
        let current = CurrentUser::from(&user);
        assert_eq!(current.id, UserId::new(3));
        assert_eq!(current.display_name(), "Jack");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("jreacher").unwrap(),
            first_name: Some(String::new()),
        };
        assert_eq!(user.display_name(), "jreacher");
    }
}
