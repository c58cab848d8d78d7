/// Audit query engine
///
/// Filtered, paginated retrieval of audit entries, always scoped to one
/// account. The scope and the permission check live inside [`search`], not
/// in callers: a query that would cross account boundaries cannot be
/// expressed through this interface.
///
/// # Semantics
///
/// - Filters are conjunctive (AND): `user_id`, `action`, and
///   `resource_type` are exact matches; `start_date`/`end_date` bound
///   `created_at` inclusively.
/// - Date bounds accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates;
///   a date-only end bound covers that whole day.
/// - Ordering is newest-first by `created_at`, ties broken by `id`
///   descending. Entry ids are insertion-ordered, so repeated identical
///   queries return the same order even under concurrent inserts.
/// - Pagination is 1-based; `per_page` defaults to 50 and is clamped into
///   1..=100 rather than rejected. An empty result set is a normal response
///   with `total = 0` and `pages = 0`.
///
/// # Example
///
/// ```no_run
/// use vigil_shared::audit::query::{search, AuditLogFilter, PageRequest};
/// use vigil_shared::auth::policy::PermissionPolicy;
/// use vigil_shared::auth::session::ActorContext;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, actor: ActorContext) -> Result<(), Box<dyn std::error::Error>> {
/// let policy = PermissionPolicy::with_defaults();
///
/// let filter = AuditLogFilter {
///     action: Some("user_login".to_string()),
///     start_date: Some("2025-03-01".to_string()),
///     ..Default::default()
/// };
///
/// let page = search(&pool, &policy, &actor, &filter, PageRequest::default(), None).await?;
/// println!("{} of {} entries", page.entries.len(), page.pagination.total);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::policy::{PermissionPolicy, ProtectedAction};
use crate::auth::session::ActorContext;
use crate::models::user::UserRole;

/// Default page size
pub const DEFAULT_PER_PAGE: i64 = 50;

/// Largest page size the engine will serve; larger requests are clamped
pub const MAX_PER_PAGE: i64 = 100;

/// Error type for audit queries
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Actor's role is not granted `view_audit_logs`
    #[error("Not permitted to view audit logs")]
    Forbidden,

    /// A filter or pagination parameter failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending parameter
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// The caller-supplied deadline elapsed before the search finished
    #[error("Audit log query timed out")]
    Timeout,

    /// Storage failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Optional filters, combined with AND semantics
///
/// Date bounds are kept as the raw request strings; [`search`] parses and
/// validates them so every caller gets identical semantics.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    /// Exact match on the acting user
    pub user_id: Option<Uuid>,

    /// Exact match on the action identifier
    pub action: Option<String>,

    /// Exact match on the resource type
    pub resource_type: Option<String>,

    /// Inclusive lower bound on `created_at` (RFC 3339 or `YYYY-MM-DD`)
    pub start_date: Option<String>,

    /// Inclusive upper bound on `created_at` (RFC 3339 or `YYYY-MM-DD`;
    /// a bare date covers the whole day)
    pub end_date: Option<String>,
}

impl AuditLogFilter {
    /// Parses the date bounds and checks the range is not inverted
    fn resolve_dates(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), QueryError> {
        let start = self
            .start_date
            .as_deref()
            .map(|raw| parse_date_bound(raw, DateBound::Start))
            .transpose()
            .map_err(|message| QueryError::Validation {
                field: "start_date",
                message,
            })?;

        let end = self
            .end_date
            .as_deref()
            .map(|raw| parse_date_bound(raw, DateBound::End))
            .transpose()
            .map_err(|message| QueryError::Validation {
                field: "end_date",
                message,
            })?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(QueryError::Validation {
                    field: "start_date",
                    message: "start_date is after end_date".to_string(),
                });
            }
        }

        Ok((start, end))
    }
}

/// Which side of the range a raw date string bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateBound {
    Start,
    End,
}

/// Parses one date bound
///
/// RFC 3339 timestamps are taken as-is. Plain dates expand to the start of
/// the day for lower bounds and the end of the day for upper bounds, so
/// `start_date=2025-03-01&end_date=2025-03-01` covers all of March 1st.
fn parse_date_bound(raw: &str, bound: DateBound) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            DateBound::Start => date.and_hms_opt(0, 0, 0),
            DateBound::End => date.and_hms_micro_opt(23, 59, 59, 999_999),
        };
        // Both constructions are in range for any valid NaiveDate
        if let Some(naive) = time {
            return Ok(naive.and_utc());
        }
    }

    Err(format!(
        "'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date",
        raw
    ))
}

/// Validated pagination request
///
/// Construct with [`PageRequest::new`]; the fields stay private so an
/// unvalidated page number cannot reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl PageRequest {
    /// Builds a page request from raw (optional) query parameters
    ///
    /// `page` defaults to 1 and must be >= 1. `per_page` defaults to
    /// [`DEFAULT_PER_PAGE`] and is clamped into 1..=[`MAX_PER_PAGE`];
    /// out-of-range sizes are clamped rather than rejected to keep the API
    /// forgiving.
    ///
    /// # Errors
    ///
    /// Returns a validation error only for `page < 1`.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Result<Self, QueryError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(QueryError::Validation {
                field: "page",
                message: "page must be 1 or greater".to_string(),
            });
        }

        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

        Ok(Self { page, per_page })
    }

    /// 1-based page number
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Effective (clamped) page size
    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Row offset of the first entry on this page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Pagination metadata returned alongside every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Requested page number (1-based)
    pub page: i64,

    /// Effective page size after clamping
    pub per_page: i64,

    /// Entries matching the filters, before pagination
    pub total: i64,

    /// Total pages: ceil(total / per_page), 0 when there are no matches
    pub pages: i64,

    /// Whether a later page exists
    pub has_next: bool,

    /// Whether an earlier page exists
    pub has_prev: bool,
}

impl PageMeta {
    /// Computes metadata for a request against a known total
    pub fn compute(request: PageRequest, total: i64) -> Self {
        let per_page = request.per_page();
        let page = request.page();
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1 && total > 0,
        }
    }
}

/// One audit entry with its actor summary resolved
///
/// The actor fields come from an explicit LEFT JOIN on users at query time;
/// they are all `None` for system-generated entries and for entries whose
/// actor has since been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// Entry ID
    pub id: i64,

    /// Acting user ID, if any
    pub user_id: Option<Uuid>,

    /// Account scope
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

    /// When the entry was recorded
    pub created_at: DateTime<Utc>,

    /// Acting user's email
    pub actor_email: Option<String>,

    /// Acting user's first name
    pub actor_first_name: Option<String>,

    /// Acting user's last name
    pub actor_last_name: Option<String>,

    /// Acting user's role
    pub actor_role: Option<UserRole>,
}

/// One page of audit entries plus pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    /// Entries on this page, newest first
    pub entries: Vec<AuditEntry>,

    /// Pagination metadata
    pub pagination: PageMeta,
}

/// Searches the audit trail on behalf of an actor
///
/// The permission check (`view_audit_logs`) and the account scope are
/// enforced here, at the query boundary. When `timeout` is given, the whole
/// search is abandoned cleanly once the deadline elapses; reads have no side
/// effects to undo.
///
/// # Errors
///
/// - `QueryError::Forbidden` if the actor's role is not granted
///   `view_audit_logs`
/// - `QueryError::Validation` for an inverted date range or unparseable
///   date bound
/// - `QueryError::Timeout` if the deadline elapses
/// - `QueryError::Database` on storage failure
pub async fn search(
    pool: &PgPool,
    policy: &PermissionPolicy,
    actor: &ActorContext,
    filter: &AuditLogFilter,
    page: PageRequest,
    timeout: Option<Duration>,
) -> Result<AuditLogPage, QueryError> {
    // Check-then-act: nothing touches storage before the policy decision
    if !policy.allows(actor.role, ProtectedAction::ViewAuditLogs) {
        return Err(QueryError::Forbidden);
    }

    let (start, end) = filter.resolve_dates()?;

    match timeout {
        Some(limit) => tokio::time::timeout(
            limit,
            run_search(pool, actor.account_id, filter, start, end, page),
        )
        .await
        .map_err(|_| QueryError::Timeout)?,
        None => run_search(pool, actor.account_id, filter, start, end, page).await,
    }
}

/// Executes the count and page queries for one validated search
async fn run_search(
    pool: &PgPool,
    account_id: Uuid,
    filter: &AuditLogFilter,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    page: PageRequest,
) -> Result<AuditLogPage, QueryError> {
    // Build the WHERE clause once; the account scope is always condition one
    let mut conditions = String::from("WHERE l.account_id = $1");
    let mut bind_count = 1;

    if filter.user_id.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND l.user_id = ${}", bind_count));
    }
    if filter.action.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND l.action = ${}", bind_count));
    }
    if filter.resource_type.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND l.resource_type = ${}", bind_count));
    }
    if start.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND l.created_at >= ${}", bind_count));
    }
    if end.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND l.created_at <= ${}", bind_count));
    }

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs l {}", conditions);

    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql).bind(account_id);
    if let Some(user_id) = filter.user_id {
        count_query = count_query.bind(user_id);
    }
    if let Some(ref action) = filter.action {
        count_query = count_query.bind(action);
    }
    if let Some(ref resource_type) = filter.resource_type {
        count_query = count_query.bind(resource_type);
    }
    if let Some(start) = start {
        count_query = count_query.bind(start);
    }
    if let Some(end) = end {
        count_query = count_query.bind(end);
    }

    let (total,) = count_query.fetch_one(pool).await?;
    let pagination = PageMeta::compute(page, total);

    if total == 0 {
        return Ok(AuditLogPage {
            entries: Vec::new(),
            pagination,
        });
    }

    let select_sql = format!(
        r#"
        SELECT l.id, l.user_id, l.account_id, l.action, l.resource_type,
               l.resource_id, l.details, l.ip_address, l.user_agent, l.created_at,
               u.email AS actor_email,
               u.first_name AS actor_first_name,
               u.last_name AS actor_last_name,
               u.role AS actor_role
        FROM audit_logs l
        LEFT JOIN users u ON u.id = l.user_id
        {}
        ORDER BY l.created_at DESC, l.id DESC
        LIMIT ${} OFFSET ${}
        "#,
        conditions,
        bind_count + 1,
        bind_count + 2,
    );

    let mut select_query = sqlx::query_as::<_, AuditEntry>(&select_sql).bind(account_id);
    if let Some(user_id) = filter.user_id {
        select_query = select_query.bind(user_id);
    }
    if let Some(ref action) = filter.action {
        select_query = select_query.bind(action);
    }
    if let Some(ref resource_type) = filter.resource_type {
        select_query = select_query.bind(resource_type);
    }
    if let Some(start) = start {
        select_query = select_query.bind(start);
    }
    if let Some(end) = end {
        select_query = select_query.bind(end);
    }

    let entries = select_query
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok(AuditLogPage {
        entries,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::new(None, None).unwrap();
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_request_rejects_page_below_one() {
        assert!(matches!(
            PageRequest::new(Some(0), None),
            Err(QueryError::Validation { field: "page", .. })
        ));
        assert!(matches!(
            PageRequest::new(Some(-3), None),
            Err(QueryError::Validation { field: "page", .. })
        ));
    }

    #[test]
    fn test_page_request_clamps_per_page() {
        // Above the maximum: clamped, not rejected
        let page = PageRequest::new(None, Some(1000)).unwrap();
        assert_eq!(page.per_page(), MAX_PER_PAGE);

        // Below one: clamped up
        let page = PageRequest::new(None, Some(0)).unwrap();
        assert_eq!(page.per_page(), 1);

        // In range: untouched
        let page = PageRequest::new(None, Some(25)).unwrap();
        assert_eq!(page.per_page(), 25);
    }

    #[test]
    fn test_page_request_offset() {
        let page = PageRequest::new(Some(3), Some(20)).unwrap();
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_page_meta_hundred_rows_two_pages() {
        let first = PageMeta::compute(PageRequest::new(Some(1), Some(50)).unwrap(), 100);
        assert_eq!(first.pages, 2);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let second = PageMeta::compute(PageRequest::new(Some(2), Some(50)).unwrap(), 100);
        assert_eq!(second.pages, 2);
        assert!(!second.has_next);
        assert!(second.has_prev);
    }

    #[test]
    fn test_page_meta_empty_result() {
        let meta = PageMeta::compute(PageRequest::default(), 0);
        assert_eq!(meta.total, 0);
        assert_eq!(meta.pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);

        // Even on a later page, an empty set has no previous page
        let meta = PageMeta::compute(PageRequest::new(Some(4), None).unwrap(), 0);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_page_meta_partial_last_page() {
        let meta = PageMeta::compute(PageRequest::new(Some(2), Some(50)).unwrap(), 51);
        assert_eq!(meta.pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_parse_date_bound_rfc3339() {
        let ts = parse_date_bound("2025-03-01T12:30:00Z", DateBound::Start).unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 30);

        // Offsets are normalized to UTC
        let ts = parse_date_bound("2025-03-01T12:30:00+02:00", DateBound::End).unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_date_bound_date_only() {
        let start = parse_date_bound("2025-03-01", DateBound::Start).unwrap();
        assert_eq!(start.hour(), 0);
        assert_eq!(start.minute(), 0);

        let end = parse_date_bound("2025-03-01", DateBound::End).unwrap();
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
        assert!(start < end);
    }

    #[test]
    fn test_parse_date_bound_invalid() {
        assert!(parse_date_bound("yesterday", DateBound::Start).is_err());
        assert!(parse_date_bound("03/01/2025", DateBound::Start).is_err());
        assert!(parse_date_bound("", DateBound::End).is_err());
    }

    #[test]
    fn test_resolve_dates_inverted_range() {
        let filter = AuditLogFilter {
            start_date: Some("2025-03-02".to_string()),
            end_date: Some("2025-03-01".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            filter.resolve_dates(),
            Err(QueryError::Validation {
                field: "start_date",
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_dates_same_day_is_valid() {
        let filter = AuditLogFilter {
            start_date: Some("2025-03-01".to_string()),
            end_date: Some("2025-03-01".to_string()),
            ..Default::default()
        };

        let (start, end) = filter.resolve_dates().unwrap();
        assert!(start.unwrap() < end.unwrap());
    }

    #[test]
    fn test_resolve_dates_open_ended() {
        let filter = AuditLogFilter::default();
        let (start, end) = filter.resolve_dates().unwrap();
        assert!(start.is_none());
        assert!(end.is_none());
    }

    // Scoping, ordering, and filter execution against a real database are
    // covered by the integration tests in vigil-api/tests/
}
