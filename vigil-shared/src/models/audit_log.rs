/// Audit log model
///
/// Audit log entries are the permanent record of the system: they are
/// inserted once and never updated or deleted. There is deliberately no
/// `update` or `delete` operation on this model.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     action VARCHAR(100) NOT NULL,
///     resource_type VARCHAR(50) NOT NULL,
///     resource_id VARCHAR(100),
///     details TEXT,
///     ip_address VARCHAR(45),
///     user_agent TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `created_at` is assigned by the server at insert time; the BIGSERIAL id
/// breaks timestamp ties deterministically. `user_id` is nullable so that
/// system-generated entries (and entries whose actor was later deleted)
/// remain valid.
///
/// Filtered retrieval lives in [`crate::audit::query`]; the immutable write
/// path with retry lives in [`crate::audit::recorder`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One immutable audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    /// Insertion-ordered entry ID
    pub id: i64,

    /// Acting user (None for system-generated entries)
    pub user_id: Option<Uuid>,

    /// Account the entry is scoped to
    pub account_id: Uuid,

    /// Action identifier, e.g. "user_login"
    pub action: String,

    /// Kind of resource the action touched, e.g. "user", "order"
    pub resource_type: String,

    /// Identifier of the touched resource (free-form, may reference any entity)
    pub resource_id: Option<String>,

    /// Opaque free-text details
    pub details: Option<String>,

    /// Client IP the request originated from
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for appending a new audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditLog {
    /// Acting user, if any
    pub user_id: Option<Uuid>,

    /// Account scope (required; every entry belongs to exactly one account)
    pub account_id: Uuid,

    /// Action identifier
    pub action: String,

    /// Resource type
    pub resource_type: String,

    /// Resource identifier
    pub resource_id: Option<String>,

    /// Free-text details
    pub details: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,
}

impl AuditLog {
    /// Appends one entry and returns its assigned id
    ///
    /// This is the only write operation that exists for audit logs.
    /// Callers normally go through [`crate::audit::recorder::AuditRecorder`],
    /// which adds retry with backoff.
    pub async fn insert(pool: &PgPool, data: &NewAuditLog) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO audit_logs
                (user_id, account_id, action, resource_type, resource_id,
                 details, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(data.user_id)
        .bind(data.account_id)
        .bind(&data.action)
        .bind(&data.resource_type)
        .bind(&data.resource_id)
        .bind(&data.details)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Fetches one entry by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let entry = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, account_id, action, resource_type, resource_id,
                   details, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    /// Counts entries scoped to one account
    pub async fn count_by_account(pool: &PgPool, account_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_audit_log_minimal() {
        let entry = NewAuditLog {
            user_id: None,
            account_id: Uuid::new_v4(),
            action: "retention_sweep".to_string(),
            resource_type: "audit_log".to_string(),
            resource_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
        };

        assert!(entry.user_id.is_none());
        assert_eq!(entry.action, "retention_sweep");
    }

    // Integration tests for database operations are in vigil-api/tests/
}
