/// Session endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/login`: verify credentials, issue an opaque session
/// - `POST /api/auth/logout`: revoke the presented session (idempotent)
///
/// Login failures are uniform: unknown email, wrong password, and a
/// deactivated user all produce the same 401 body, and the unknown-email
/// path still performs one Argon2 verification so the two failure paths sit
/// in the same timing class.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vigil_shared::audit::recorder::RequestMeta;
use vigil_shared::auth::{
    middleware::{extract_session_token, SESSION_COOKIE},
    password,
};
use vigil_shared::models::user::{User, UserRole};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Summary of the logged-in user
#[derive(Debug, Serialize)]
pub struct LoginUser {
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

    /// Account the session is bound to
    pub account_id: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Confirmation message
    pub message: String,

    /// The authenticated user
    pub user: LoginUser,

    /// Opaque session token (also set as the session cookie)
    pub session_token: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Confirmation message
    pub message: String,
}

fn uniform_unauthorized() -> ApiError {
    // One message for unknown email, wrong password, and inactive user; the
    // server log keeps the failure without echoing which case it was
    tracing::debug!("login attempt rejected");
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "admin@sample-store.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: wrong credentials or inactive user (uniform)
/// - `422 Unprocessable Entity`: malformed email
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            // Burn one verification against a dummy hash so an unknown
            // email costs the same as a wrong password
            let _ = password::verify_password(&req.password, password::dummy_hash());
            return Err(uniform_unauthorized());
        }
    };

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid || !user.is_active {
        return Err(uniform_unauthorized());
    }

    let session = state.sessions.issue(&user).await;

    let meta = RequestMeta::from_headers(&headers);
    state
        .recorder
        .record(
            &session.actor(),
            "user_login",
            "user",
            Some(user.id.to_string()),
            Some("User logged in successfully".to_string()),
            &meta,
        )
        .await;

    let body = Json(LoginResponse {
        message: "Login successful".to_string(),
        user: LoginUser {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            account_id: user.account_id.to_string(),
        },
        session_token: session.token.clone(),
    });

    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        session_cookie(&session.token)
            .ok_or_else(|| ApiError::InternalError("Invalid session cookie value".to_string()))?,
    );

    Ok(response)
}

/// Logout endpoint
///
/// Revokes the presented session and clears the cookie. Idempotent: a
/// missing, unknown, or already-revoked token still yields 200.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/logout
/// ```
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = extract_session_token(&headers) {
        // Record the logout while the session still resolves
        if let Some(actor) = state.sessions.resolve(&token).await {
            let meta = RequestMeta::from_headers(&headers);
            state
                .recorder
                .record(
                    &actor,
                    "user_logout",
                    "user",
                    Some(actor.user_id.to_string()),
                    Some("User logged out".to_string()),
                    &meta,
                )
                .await;
        }

        state.sessions.revoke(&token).await;
    }

    let body = Json(LogoutResponse {
        message: "Logout successful".to_string(),
    });

    let mut response = (StatusCode::OK, body).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, clear_session_cookie());

    Ok(response)
}

/// Builds the session cookie for a freshly issued token
fn session_cookie(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    ))
    .ok()
}

/// Builds the cookie that clears the session on logout
fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("vigil_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("vgl_abc123").expect("valid token should build a cookie");
        let value = cookie.to_str().unwrap();

        assert!(value.starts_with("vigil_session=vgl_abc123"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Path=/"));
    }

    #[test]
    fn test_session_cookie_rejects_control_chars() {
        assert!(session_cookie("vgl_bad\r\ntoken").is_none());
    }

    #[test]
    fn test_clear_session_cookie_expires() {
        let value = clear_session_cookie();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
