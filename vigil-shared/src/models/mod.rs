/// Database models for Vigil
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `account`: Tenant accounts (the isolation boundary)
/// - `user`: User accounts with roles and credentials
/// - `audit_log`: Append-only audit trail entries
///
/// # Example
///
/// ```no_run
/// use vigil_shared::models::user::{User, CreateUser, UserRole};
/// use vigil_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "analyst@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     role: UserRole::Analyst,
///     account_id: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod audit_log;
pub mod user;
