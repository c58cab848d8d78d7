/// User model and database operations
///
/// Users belong to exactly one account for their lifetime and carry one of
/// four roles that drive the permission policy.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('owner', 'admin', 'analyst', 'content_creator');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     role user_role NOT NULL,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX users_email_key ON users (LOWER(email));
/// ```
///
/// Email uniqueness is global, not per-account, and case-insensitive via the
/// unique index on `LOWER(email)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within their account
///
/// Roles form a closed set; anything else is rejected at the boundary.
/// What each role may do is decided by the permission policy table, not by
/// branching on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Account owner, created together with the account
    Owner,

    /// Administrator
    Admin,

    /// Analyst
    Analyst,

    /// Content creator
    ContentCreator,
}

impl UserRole {
    /// Converts role to string for display and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Admin => "admin",
            UserRole::Analyst => "analyst",
            UserRole::ContentCreator => "content_creator",
        }
    }

    /// Parses a role from its wire representation
    ///
    /// Returns `None` for anything outside the four enumerated values; the
    /// caller turns that into an invalid-role validation error.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(UserRole::Owner),
            "admin" => Some(UserRole::Admin),
            "analyst" => Some(UserRole::Analyst),
            "content_creator" => Some(UserRole::ContentCreator),
            _ => None,
        }
    }
}

/// User model representing a member of an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (unique case-insensitively)
    ///
    /// Must be unique across all users, in every account
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never store plaintext passwords
    pub password_hash: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Role within the account
    pub role: UserRole,

    /// Account this user belongs to
    pub account_id: Uuid,

    /// Whether the user may log in
    pub is_active: bool,

    /// When the user account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// The password must already be hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (stored as given, matched case-insensitively)
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Role to assign
    pub role: UserRole,

    /// Account the user belongs to
    pub account_id: Uuid,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (`users_email_key` violation)
    /// - The account does not exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role, account_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, first_name, last_name, role,
                      account_id, is_active, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.role)
        .bind(data.account_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   account_id, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Lookup is case-insensitive, like the uniqueness constraint.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   account_id, is_active, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all users belonging to one account
    ///
    /// Ordered by creation date (oldest first), so the owner comes first.
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   account_id, is_active, created_at
            FROM users
            WHERE account_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Owner.as_str(), "owner");
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Analyst.as_str(), "analyst");
        assert_eq!(UserRole::ContentCreator.as_str(), "content_creator");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("owner"), Some(UserRole::Owner));
        assert_eq!(UserRole::from_str("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("analyst"), Some(UserRole::Analyst));
        assert_eq!(
            UserRole::from_str("content_creator"),
            Some(UserRole::ContentCreator)
        );
        assert_eq!(UserRole::from_str("superuser"), None);
        assert_eq!(UserRole::from_str("OWNER"), None);
        assert_eq!(UserRole::from_str(""), None);
    }

    #[test]
    fn test_user_role_roundtrip() {
        for role in [
            UserRole::Owner,
            UserRole::Admin,
            UserRole::Analyst,
            UserRole::ContentCreator,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_user_role_serde_rename() {
        let json = serde_json::to_string(&UserRole::ContentCreator).unwrap();
        assert_eq!(json, "\"content_creator\"");

        let role: UserRole = serde_json::from_str("\"analyst\"").unwrap();
        assert_eq!(role, UserRole::Analyst);
    }

    // Integration tests for database operations are in vigil-api/tests/
}
