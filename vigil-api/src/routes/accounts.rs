/// Account endpoints
///
/// # Endpoints
///
/// - `POST /api/accounts`: create an account together with its owner
///   (public: this is how new tenants arrive)
/// - `GET /api/accounts/:id`: read the actor's own account
///
/// A request for another tenant's account answers 404, not 403, so account
/// ids cannot be probed for existence.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use vigil_shared::audit::recorder::RequestMeta;
use vigil_shared::auth::{
    password,
    policy::ProtectedAction,
    session::ActorContext,
};
use vigil_shared::models::account::{Account, CreateAccount};
use vigil_shared::models::user::UserRole;

/// Create account request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Organization name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Organization domain (globally unique)
    #[validate(length(min = 1, max = 255, message = "Domain must be 1-255 characters"))]
    pub domain: String,

    /// Owner's email address
    #[validate(email(message = "Invalid email format"))]
    pub owner_email: String,

    /// Owner's password (validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub owner_password: String,

    /// Owner's first name
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub owner_first_name: String,

    /// Owner's last name
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub owner_last_name: String,
}

/// Account representation in responses
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID
    pub id: String,

    /// Organization name
    pub name: String,

    /// Organization domain
    pub domain: String,

    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name,
            domain: account.domain,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Owner summary returned on account creation
#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    /// User ID
    pub id: String,

    /// Email address
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Role (always `owner`)
    pub role: UserRole,
}

/// Create account response
#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    /// Confirmation message
    pub message: String,

    /// The new account
    pub account: AccountResponse,

    /// Its owner
    pub owner: OwnerResponse,
}

/// Get account response
#[derive(Debug, Serialize)]
pub struct GetAccountResponse {
    /// The account
    pub account: AccountResponse,
}

/// Create a new account with its owner
///
/// Both records are created in one transaction; uniqueness of the domain and
/// the owner email is enforced by database constraints, so two concurrent
/// requests for the same domain cannot both succeed.
///
/// # Endpoint
///
/// ```text
/// POST /api/accounts
/// Content-Type: application/json
///
/// {
///   "name": "Sample Ecommerce Store",
///   "domain": "sample-store.com",
///   "owner_email": "owner@sample-store.com",
///   "owner_password": "Owner-pass1",
///   "owner_first_name": "John",
///   "owner_last_name": "Owner"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: domain or email already exists
/// - `422 Unprocessable Entity`: validation or password strength failure
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<CreateAccountResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.owner_password)
        .map_err(|message| ApiError::invalid_field("owner_password", message))?;

    let password_hash = password::hash_password(&req.owner_password)?;

    let (account, owner) = Account::create_with_owner(
        &state.db,
        CreateAccount {
            name: req.name,
            domain: req.domain,
            owner_email: req.owner_email,
            owner_password_hash: password_hash,
            owner_first_name: req.owner_first_name,
            owner_last_name: req.owner_last_name,
        },
    )
    .await?;

    // Attribute the creation to the new owner; there is no session yet
    let actor = ActorContext {
        user_id: owner.id,
        account_id: account.id,
        role: owner.role,
    };
    let meta = RequestMeta::from_headers(&headers);
    state
        .recorder
        .record(
            &actor,
            "account_created",
            "account",
            Some(account.id.to_string()),
            Some(format!("Account {} created", account.name)),
            &meta,
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            message: "Account created successfully".to_string(),
            account: account.into(),
            owner: OwnerResponse {
                id: owner.id.to_string(),
                email: owner.email,
                first_name: owner.first_name,
                last_name: owner.last_name,
                role: owner.role,
            },
        }),
    ))
}

/// Read one account
///
/// Actors can only read their own account; any other id answers 404.
///
/// # Endpoint
///
/// ```text
/// GET /api/accounts/{id}
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session
/// - `403 Forbidden`: role lacks `view_account` (no default role does)
/// - `404 Not Found`: unknown id, or an id outside the actor's account
pub async fn get_account(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<GetAccountResponse>> {
    if !state.policy.allows(actor.role, ProtectedAction::ViewAccount) {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    // Cross-account ids are indistinguishable from absent ones
    if actor.account_id != account_id {
        return Err(ApiError::NotFound("Account not found".to_string()));
    }

    let account = Account::find_by_id(&state.db, account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(GetAccountResponse {
        account: account.into(),
    }))
}
