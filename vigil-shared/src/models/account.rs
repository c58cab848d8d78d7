/// Account model and database operations
///
/// Accounts are the tenant boundary for the audit trail: every user and every
/// audit log entry belongs to exactly one account.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     domain VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT accounts_domain_key UNIQUE (domain)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use vigil_shared::models::account::{Account, CreateAccount};
/// use vigil_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let (account, owner) = Account::create_with_owner(&pool, CreateAccount {
///     name: "Sample Ecommerce Store".to_string(),
///     domain: "sample-store.com".to_string(),
///     owner_email: "owner@sample-store.com".to_string(),
///     owner_password_hash: "$argon2id$...".to_string(),
///     owner_first_name: "John".to_string(),
///     owner_last_name: "Owner".to_string(),
/// }).await?;
///
/// println!("Created account {} owned by {}", account.id, owner.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{User, UserRole};

/// Account model representing a tenant organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4)
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Organization domain
    ///
    /// Globally unique across all accounts
    pub domain: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new account together with its owner
///
/// The owner password must already be hashed; this layer never sees
/// plaintext credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Organization name
    pub name: String,

    /// Organization domain (must be unique)
    pub domain: String,

    /// Owner's email address
    pub owner_email: String,

    /// Owner's Argon2id password hash
    pub owner_password_hash: String,

    /// Owner's first name
    pub owner_first_name: String,

    /// Owner's last name
    pub owner_last_name: String,
}

impl Account {
    /// Creates an account and its owner user atomically
    ///
    /// Both inserts run in a single transaction so a half-created account can
    /// never be observed. Uniqueness of `domain` and `owner_email` is enforced
    /// by database constraints inside the transaction, so two concurrent
    /// creations with the same domain cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The domain already exists (`accounts_domain_key` violation)
    /// - The owner email already exists (`users_email_key` violation)
    /// - Database connection fails
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateAccount,
    ) -> Result<(Self, User), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, domain)
            VALUES ($1, $2)
            RETURNING id, name, domain, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.domain)
        .fetch_one(&mut *tx)
        .await?;

        let owner = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role, account_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, first_name, last_name, role,
                      account_id, is_active, created_at
            "#,
        )
        .bind(data.owner_email)
        .bind(data.owner_password_hash)
        .bind(data.owner_first_name)
        .bind(data.owner_last_name)
        .bind(UserRole::Owner)
        .bind(account.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((account, owner))
    }

    /// Finds an account by ID
    ///
    /// # Returns
    ///
    /// The account if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, domain, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by domain (exact match)
    pub async fn find_by_domain(pool: &PgPool, domain: &str) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, domain, created_at
            FROM accounts
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_struct() {
        let create = CreateAccount {
            name: "Test Store".to_string(),
            domain: "test-store.com".to_string(),
            owner_email: "owner@test-store.com".to_string(),
            owner_password_hash: "hash".to_string(),
            owner_first_name: "Test".to_string(),
            owner_last_name: "Owner".to_string(),
        };

        assert_eq!(create.domain, "test-store.com");
        assert_eq!(create.owner_email, "owner@test-store.com");
    }

    // Integration tests for database operations are in vigil-api/tests/
}
