//! Domain models for the site.
//!
//! - [`session`] - identity stored in the session cookie's server-side record
//! - [`user`] - local user accounts
//! - [`movie`] - search results, stored movies, and cart entries

pub mod movie;
pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
