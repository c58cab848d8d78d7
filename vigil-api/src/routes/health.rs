/// Service banner and health check endpoints
///
/// Both endpoints are public.
///
/// # Endpoints
///
/// - `GET /`: service banner with the endpoint map
/// - `GET /health`: liveness plus database connectivity

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Service banner
///
/// Mirrors the classic index payload: a short description and the map of
/// API endpoints.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Vigil Audit Trail API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "accounts": "/api/accounts",
            "users": "/api/users",
            "audit_logs": "/api/audit-logs",
            "auth": "/api/auth"
        }
    }))
}

/// Health check handler
///
/// Returns `healthy` with a connected database, `degraded` otherwise; the
/// endpoint itself stays 200 so probes can read the body.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}
