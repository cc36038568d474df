//! Business logic services for the site.
//!
//! # Services
//!
//! - `auth` - Account registration and password sign-in

pub mod auth;
