/// User management endpoints
///
/// # Endpoints
///
/// - `POST /api/users`: create a user inside the actor's account
/// - `GET /api/users`: list the actor's account's users
///
/// Both consult the permission policy (`create_user` / `view_users`) before
/// touching storage. New users always inherit the creator's account; there
/// is no way to create a user in another tenant through this interface.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vigil_shared::audit::recorder::RequestMeta;
use vigil_shared::auth::{password, policy::ProtectedAction, session::ActorContext};
use vigil_shared::models::user::{CreateUser, User, UserRole};

/// Create user request
///
/// The role arrives as a string and is parsed against the closed role set;
/// anything else is an invalid-role validation error.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// First name
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    /// Last name
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    /// Role: one of `owner`, `admin`, `analyst`, `content_creator`
    pub role: String,
}

/// User representation in responses
#[derive(Debug, Serialize)]
pub struct UserResponse {
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

    /// Whether the user may log in
    pub is_active: bool,

    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Create user response
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    /// Confirmation message
    pub message: String,

    /// The new user
    pub user: UserResponse,
}

/// List users response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// Users in the actor's account, oldest first
    pub users: Vec<UserResponse>,
}

/// Create a user in the actor's account
///
/// # Endpoint
///
/// ```text
/// POST /api/users
/// Content-Type: application/json
///
/// {
///   "email": "analyst@sample-store.com",
///   "password": "Analyst-pass1",
///   "first_name": "Bob",
///   "last_name": "Analyst",
///   "role": "analyst"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session
/// - `403 Forbidden`: role lacks `create_user`
/// - `409 Conflict`: email already exists
/// - `422 Unprocessable Entity`: validation failure or unknown role
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    if !state.policy.allows(actor.role, ProtectedAction::CreateUser) {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    req.validate()?;

    let role = UserRole::from_str(&req.role)
        .ok_or_else(|| ApiError::invalid_field("role", "Invalid role"))?;

    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            role,
            // New users always land in the creator's account
            account_id: actor.account_id,
        },
    )
    .await?;

    let meta = RequestMeta::from_headers(&headers);
    state
        .recorder
        .record(
            &actor,
            "user_created",
            "user",
            Some(user.id.to_string()),
            Some(format!(
                "User {} created with role {}",
                user.email,
                user.role.as_str()
            )),
            &meta,
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// List the users of the actor's account
///
/// # Endpoint
///
/// ```text
/// GET /api/users
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session
/// - `403 Forbidden`: role lacks `view_users`
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<ListUsersResponse>> {
    if !state.policy.allows(actor.role, ProtectedAction::ViewUsers) {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let users = User::list_by_account(&state.db, actor.account_id).await?;

    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}
