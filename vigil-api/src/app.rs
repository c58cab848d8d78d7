/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use vigil_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::postgres::PgPoolOptions;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPoolOptions::new().connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use vigil_shared::audit::recorder::AuditRecorder;
use vigil_shared::auth::{
    middleware::create_session_middleware, policy::PermissionPolicy, session::SessionStore,
};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Process-wide session store
    pub sessions: SessionStore,

    /// Permission decision table
    pub policy: Arc<PermissionPolicy>,

    /// Audit write path
    pub recorder: AuditRecorder,
}

impl AppState {
    /// Creates new application state with the default permission policy
    pub fn new(db: PgPool, config: Config) -> Self {
        let sessions = SessionStore::new(config.session_ttl());
        let recorder = AuditRecorder::new(db.clone());

        Self {
            db,
            config: Arc::new(config),
            sessions,
            policy: Arc::new(PermissionPolicy::with_defaults()),
            recorder,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                        # Service banner (public)
/// ├── GET  /health                  # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /login           # Issue a session (public)
///     │   └── POST /logout          # Revoke a session (idempotent, public)
///     ├── POST /accounts            # Create account + owner (public)
///     ├── GET  /accounts/:id        # Own account only (session)
///     ├── POST /users               # create_user permission (session)
///     ├── GET  /users               # view_users permission (session)
///     └── GET  /audit-logs          # view_audit_logs permission (session)
/// ```
///
/// Protected routes sit behind the session middleware, which resolves the
/// opaque token into an `ActorContext` extension or answers 401. Role
/// checks happen inside the handlers (and, for audit queries, inside the
/// query engine itself).
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: no session required
    let public_routes = Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health_check));

    // Auth routes: login issues sessions, logout is idempotent and must not
    // demand a valid one
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    // Everything below requires a resolved session: the middleware turns the
    // opaque token into an ActorContext extension or answers a uniform 401
    let protected_routes = Router::new()
        .route("/accounts/:id", get(routes::accounts::get_account))
        .route(
            "/users",
            post(routes::users::create_user).get(routes::users::list_users),
        )
        .route("/audit-logs", get(routes::audit_logs::list_audit_logs))
        .layer(axum::middleware::from_fn(create_session_middleware(
            state.sessions.clone(),
        )));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        // Account creation is the entry point for new tenants: public
        .route("/accounts", post(routes::accounts::create_account))
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
