//! # Taskdeck Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the Taskdeck API server and the trash sweeper.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `roles`: Per-project role resolution and permission checks
//! - `lifecycle`: Active / archived / trashed states and retention rules
//! - `auth`: Password hashing, session tokens, and middleware
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod roles;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
