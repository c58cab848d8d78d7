//! # Vigil Shared Library
//!
//! This crate contains the domain types and business logic shared by the
//! Vigil audit trail service binaries.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication, sessions, and the permission policy
//! - `audit`: Audit write path and query engine
//! - `db`: Connection pool and migration utilities

pub mod audit;
pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Vigil shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
