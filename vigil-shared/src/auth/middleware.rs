/// Session authentication middleware for Axum
///
/// The middleware extracts the opaque session token from the request,
/// resolves it against the [`SessionStore`], and injects the resulting
/// [`ActorContext`] into request extensions. Handlers behind it can extract
/// the actor with `Extension<ActorContext>` and never see raw credentials.
///
/// # Token Transport
///
/// Two equivalent transports are accepted:
///
/// - `Authorization: Bearer vgl_...`
/// - `Cookie: vigil_session=vgl_...` (set by the login endpoint)
///
/// # Failure Behavior
///
/// Missing, unknown, and expired tokens all yield 401 with the same body.
/// The guarded handler is never entered on failure.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::session::SessionStore;

/// Name of the session cookie set on login
pub const SESSION_COOKIE: &str = "vigil_session";

/// Error type for the session middleware
#[derive(Debug)]
pub enum AuthError {
    /// No token was presented
    MissingCredentials,

    /// Token did not resolve (unknown or expired; not distinguished)
    InvalidSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // One body for every failure mode: the client learns nothing about
        // whether a token existed, was revoked, or expired
        let body = Json(json!({
            "error": "unauthorized",
            "message": "Authentication required",
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Pulls the session token out of the request headers
///
/// Checks the `Authorization: Bearer` header first, then the session cookie.
/// Also used by the logout handler, which accepts absent tokens (logout is
/// idempotent).
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    let cookies = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.trim().to_string())
    })
}

/// Session authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if no token is presented or the token does not
/// resolve to a live session.
pub async fn session_auth_middleware(
    store: SessionStore,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_session_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let actor = store
        .resolve(&token)
        .await
        .ok_or(AuthError::InvalidSession)?;

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// Creates a session authentication middleware closure
///
/// Helper that captures the store and returns a function usable with
/// `axum::middleware::from_fn`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use vigil_shared::auth::session::SessionStore;
/// use vigil_shared::auth::middleware::create_session_middleware;
/// use std::time::Duration;
///
/// let store = SessionStore::new(Duration::from_secs(86_400));
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "OK" }))
///     .layer(middleware::from_fn(create_session_middleware(store)));
/// ```
pub fn create_session_middleware(
    store: SessionStore,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    move |req, next| {
        let store = store.clone();
        Box::pin(session_auth_middleware(store, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer vgl_abc123");
        assert_eq!(
            extract_session_token(&headers),
            Some("vgl_abc123".to_string())
        );
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let headers = headers_with(header::COOKIE, "theme=dark; vigil_session=vgl_xyz789");
        assert_eq!(
            extract_session_token(&headers),
            Some("vgl_xyz789".to_string())
        );
    }

    #[test]
    fn test_bearer_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer vgl_from_header"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("vigil_session=vgl_from_cookie"),
        );

        assert_eq!(
            extract_session_token(&headers),
            Some("vgl_from_header".to_string())
        );
    }

    #[test]
    fn test_extract_token_missing() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);

        // Wrong scheme is not a token
        let headers = headers_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert_eq!(extract_session_token(&headers), None);

        // Unrelated cookies only
        let headers = headers_with(header::COOKIE, "theme=dark; lang=en");
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn test_auth_error_responses_are_uniform() {
        let missing = AuthError::MissingCredentials.into_response();
        let invalid = AuthError::InvalidSession.into_response();

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    }
}
