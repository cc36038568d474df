//! Authentication route handlers.
//!
//! The sign-in page doubles as the registration page: both forms live on `/`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
///
/// Missing fields arrive empty and fail validation like blank ones.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
///
/// Missing fields arrive empty so every failure ends in an `?error=` redirect.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in and registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "sign-in.html")]
pub struct SignInTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    /// Username to pre-fill after a failed sign-in.
    pub username: String,
}

/// Messages for the `?error=` codes used in redirects to `/`.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "credentials" => Some("Invalid username or password."),
        "username_taken" => Some("That username is already taken."),
        "invalid_username" => {
            Some("Usernames are 1-32 characters: letters, digits, '_', '-' or '.'.")
        }
        "weak_password" => Some("Passwords must be at least 8 characters."),
        "failed" => Some("Something went wrong. Please try again."),
        _ => None,
    }
}

/// Messages for the `?success=` codes used in redirects to `/`.
fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "registered" => Some("Account created. You can sign in now."),
        _ => None,
    }
}

/// The `?error=` code reported for a failed registration.
const fn register_error_code(error: &AuthError) -> &'static str {
    match error {
        AuthError::UserAlreadyExists => "username_taken",
        AuthError::InvalidUsername(_) => "invalid_username",
        AuthError::WeakPassword(_) => "weak_password",
        AuthError::InvalidCredentials | AuthError::Repository(_) | AuthError::PasswordHash => {
            "failed"
        }
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the sign-in page.
///
/// Signed-in users go straight to `/index`.
pub async fn sign_in_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/index").into_response();
    }

    SignInTemplate {
        error: query
            .error
            .as_deref()
            .and_then(error_message)
            .map(String::from),
        success: query
            .success
            .as_deref()
            .and_then(success_message)
            .map(String::from),
        username: String::new(),
    }
    .into_response()
}

/// Handle sign-in form submission.
///
/// Wrong credentials re-render the sign-in page with a 401.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    let user = match auth.login(form.username.trim(), &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Sign-in rejected");
            let page = SignInTemplate {
                error: error_message("credentials").map(String::from),
                success: None,
                username: form.username,
            };
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Redirect::to("/index").into_response())
}

/// Handle registration form submission.
///
/// Always redirects back to `/` with a success or error code.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Redirect {
    let auth = AuthService::new(state.pool());

    let result = auth
        .register(Registration {
            username: form.username.trim(),
            password: &form.password,
            first_name: &form.first_name,
            last_name: &form.last_name,
        })
        .await;

    match result {
        Ok(_) => Redirect::to("/?success=registered"),
        Err(e) => {
            let code = register_error_code(&e);
            if code == "failed" {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Registration failed");
            } else {
                tracing::info!(error = %e, "Registration rejected");
            }
            Redirect::to(&format!("/?error={code}"))
        }
    }
}

/// Sign out and return to the sign-in page.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;
    use reelcart_core::UsernameError;

    #[test]
    fn test_register_error_codes() {
        assert_eq!(
            register_error_code(&AuthError::UserAlreadyExists),
            "username_taken"
        );
        assert_eq!(
            register_error_code(&AuthError::InvalidUsername(UsernameError::Empty)),
            "invalid_username"
        );
        assert_eq!(
            register_error_code(&AuthError::WeakPassword("short".to_string())),
            "weak_password"
        );
        assert_eq!(
            register_error_code(&AuthError::Repository(RepositoryError::NotFound)),
            "failed"
        );
    }

    #[test]
    fn test_every_error_code_has_a_message() {
        for code in [
            "credentials",
            "username_taken",
            "invalid_username",
            "weak_password",
            "failed",
        ] {
            assert!(error_message(code).is_some(), "missing message for {code}");
        }
        assert!(error_message("<script>").is_none());
    }

    #[test]
    fn test_success_messages() {
        assert!(success_message("registered").is_some());
        assert!(success_message("anything-else").is_none());
    }
}
