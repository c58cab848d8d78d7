/// Audit trail search endpoint
///
/// # Endpoint
///
/// `GET /api/audit-logs` with optional query parameters:
///
/// - `page` (1-based, default 1), `per_page` (default 50, clamped to 100)
/// - `user_id`, `action`, `resource_type`: exact-match filters
/// - `start_date`, `end_date`: inclusive bounds on `created_at`
///   (RFC 3339 timestamps or `YYYY-MM-DD` dates)
///
/// The permission check and the account scope live in the query engine; the
/// handler only translates between the wire and [`vigil_shared::audit::query`].

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_shared::audit::query::{search, AuditEntry, AuditLogFilter, PageMeta, PageRequest};
use vigil_shared::auth::session::ActorContext;
use vigil_shared::models::user::UserRole;

/// Raw query parameters
#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    /// 1-based page number
    pub page: Option<i64>,

    /// Page size (clamped server-side)
    pub per_page: Option<i64>,

    /// Filter: acting user
    pub user_id: Option<Uuid>,

    /// Filter: exact action identifier
    pub action: Option<String>,

    /// Filter: exact resource type
    pub resource_type: Option<String>,

    /// Filter: inclusive lower bound on created_at
    pub start_date: Option<String>,

    /// Filter: inclusive upper bound on created_at
    pub end_date: Option<String>,
}

/// Acting user summary embedded in each entry
#[derive(Debug, Serialize)]
pub struct AuditActorResponse {
    /// User ID
    pub id: String,

    /// Email address
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Role within the account
    pub role: UserRole,
}

/// One audit entry on the wire
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    /// Entry ID
    pub id: i64,

    /// Acting user, null for system entries and deleted actors
    pub user: Option<AuditActorResponse>,

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

    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl From<AuditEntry> for AuditLogResponse {
    fn from(entry: AuditEntry) -> Self {
        // The actor summary is present only when the join found a live user
        let user = match (entry.user_id, entry.actor_email, entry.actor_role) {
            (Some(id), Some(email), Some(role)) => Some(AuditActorResponse {
                id: id.to_string(),
                email,
                first_name: entry.actor_first_name.unwrap_or_default(),
                last_name: entry.actor_last_name.unwrap_or_default(),
                role,
            }),
            _ => None,
        };

        Self {
            id: entry.id,
            user,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            details: entry.details,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Search response
#[derive(Debug, Serialize)]
pub struct ListAuditLogsResponse {
    /// Entries on this page, newest first
    pub audit_logs: Vec<AuditLogResponse>,

    /// Pagination metadata
    pub pagination: PageMeta,
}

/// Search the actor's account's audit trail
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session
/// - `403 Forbidden`: role lacks `view_audit_logs`
/// - `422 Unprocessable Entity`: `page < 1`, unparseable date, or
///   `start_date > end_date`
/// - `503 Service Unavailable`: query deadline elapsed
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<ListAuditLogsResponse>> {
    let page = PageRequest::new(params.page, params.per_page)?;

    let filter = AuditLogFilter {
        user_id: params.user_id,
        action: params.action,
        resource_type: params.resource_type,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let result = search(
        &state.db,
        &state.policy,
        &actor,
        &filter,
        page,
        Some(state.config.query_timeout()),
    )
    .await?;

    Ok(Json(ListAuditLogsResponse {
        audit_logs: result
            .entries
            .into_iter()
            .map(AuditLogResponse::from)
            .collect(),
        pagination: result.pagination,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(user: bool) -> AuditEntry {
        AuditEntry {
            id: 7,
            user_id: user.then(Uuid::new_v4),
            account_id: Uuid::new_v4(),
            action: "user_login".to_string(),
            resource_type: "user".to_string(),
            resource_id: Some("42".to_string()),
            details: None,
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: None,
            created_at: Utc::now(),
            actor_email: user.then(|| "admin@sample-store.com".to_string()),
            actor_first_name: user.then(|| "Jane".to_string()),
            actor_last_name: user.then(|| "Admin".to_string()),
            actor_role: user.then_some(UserRole::Admin),
        }
    }

    #[test]
    fn test_entry_with_actor() {
        let response = AuditLogResponse::from(entry(true));
        let user = response.user.expect("actor summary should be present");
        assert_eq!(user.email, "admin@sample-store.com");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_system_entry_has_null_user() {
        let response = AuditLogResponse::from(entry(false));
        assert!(response.user.is_none());
        assert_eq!(response.action, "user_login");
    }
}
