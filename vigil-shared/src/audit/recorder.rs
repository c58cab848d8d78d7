/// Audit write path
///
/// Appends immutable audit entries as a side effect of tracked actions.
/// The recorder never fails its caller: transient storage errors are retried
/// with bounded exponential backoff, and a persistently failing write is
/// dropped with a degraded-mode warning while the triggering action still
/// completes. Audit completeness is best-effort relative to primary
/// operation availability; that trade-off is deliberate and logged, never
/// silent.
///
/// # Example
///
/// ```no_run
/// use vigil_shared::audit::recorder::{AuditRecorder, RequestMeta};
/// use vigil_shared::auth::session::ActorContext;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, actor: ActorContext, meta: RequestMeta) {
/// let recorder = AuditRecorder::new(pool);
///
/// recorder
///     .record(
///         &actor,
///         "user_login",
///         "user",
///         Some(actor.user_id.to_string()),
///         Some("User logged in successfully".to_string()),
///         &meta,
///     )
///     .await;
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::session::ActorContext;
use crate::models::audit_log::{AuditLog, NewAuditLog};

/// Per-request metadata captured into audit entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Client IP address, if known
    pub ip_address: Option<String>,

    /// Client user agent, if sent
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Builds request metadata from HTTP headers
    ///
    /// The client IP is taken from the first entry of `X-Forwarded-For`
    /// (this service is expected to sit behind a proxy that sets it).
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Appends audit entries with bounded retry
///
/// Cheap to clone; holds only the pool handle and retry policy.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    pool: PgPool,
    max_attempts: u32,
    backoff_base: Duration,
}

impl AuditRecorder {
    /// Default number of insert attempts per entry
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default base delay between attempts (doubles each retry)
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);

    /// Creates a recorder with the default retry policy
    pub fn new(pool: PgPool) -> Self {
        Self::with_policy(
            pool,
            Self::DEFAULT_MAX_ATTEMPTS,
            Self::DEFAULT_BACKOFF_BASE,
        )
    }

    /// Creates a recorder with an explicit retry policy
    pub fn with_policy(pool: PgPool, max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Records an action performed by an authenticated actor
    ///
    /// The entry is scoped to the actor's account. Returns the entry id, or
    /// `None` if the write failed persistently (the caller proceeds either
    /// way).
    pub async fn record(
        &self,
        actor: &ActorContext,
        action: &str,
        resource_type: &str,
        resource_id: Option<String>,
        details: Option<String>,
        meta: &RequestMeta,
    ) -> Option<i64> {
        self.append(NewAuditLog {
            user_id: Some(actor.user_id),
            account_id: actor.account_id,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id,
            details,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        })
        .await
    }

    /// Records a system-generated entry with no acting user
    pub async fn record_system(
        &self,
        account_id: Uuid,
        action: &str,
        resource_type: &str,
        resource_id: Option<String>,
        details: Option<String>,
    ) -> Option<i64> {
        self.append(NewAuditLog {
            user_id: None,
            account_id,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id,
            details,
            ip_address: None,
            user_agent: None,
        })
        .await
    }

    /// Insert with bounded retry
    ///
    /// Non-transient errors (constraint violations, bad references) fail
    /// immediately; retrying them cannot succeed.
    async fn append(&self, entry: NewAuditLog) -> Option<i64> {
        let mut delay = self.backoff_base;

        for attempt in 1..=self.max_attempts {
            match AuditLog::insert(&self.pool, &entry).await {
                Ok(id) => {
                    debug!(id, action = %entry.action, "audit entry recorded");
                    return Some(id);
                }
                Err(e) if is_transient(&e) && attempt < self.max_attempts => {
                    debug!(
                        attempt,
                        action = %entry.action,
                        error = %e,
                        "transient audit write failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    warn!(
                        action = %entry.action,
                        account_id = %entry.account_id,
                        error = %e,
                        "audit entry dropped after {} attempt(s); running degraded",
                        attempt
                    );
                    return None;
                }
            }
        }

        None
    }
}

/// Whether an insert failure is worth retrying
///
/// Connectivity and pool exhaustion can clear up on their own; database
/// errors (constraint or foreign key violations) cannot.
pub fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_meta_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64)"),
        );

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(
            meta.user_agent.as_deref(),
            Some("Mozilla/5.0 (X11; Linux x86_64)")
        );
    }

    #[test]
    fn test_request_meta_missing_headers() {
        let meta = RequestMeta::from_headers(&HeaderMap::new());
        assert!(meta.ip_address.is_none());
        assert!(meta.user_agent.is_none());
    }

    #[test]
    fn test_is_transient_classification() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(is_transient(&sqlx::Error::PoolClosed));
        assert!(is_transient(&sqlx::Error::WorkerCrashed));
        assert!(is_transient(&sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        ))));

        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_transient(&sqlx::Error::ColumnNotFound(
            "missing".to_string()
        )));
    }

    // Retry/backoff behavior against a real database is covered by the
    // integration tests in vigil-api/tests/
}
