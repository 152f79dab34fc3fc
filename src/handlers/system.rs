// handlers/system.rs - service descriptor, health check and 404 fallback

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "PTM BMUP Setting API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "endpoints": {
            "health": "/health",
            "members": "/api/setting/members",
            "members_load_more": "/api/setting/members/load-more",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();
    let environment = state.config.environment.as_str();
    let version = env!("CARGO_PKG_VERSION");

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Service is healthy",
                "timestamp": now,
                "environment": environment,
                "version": version,
                "database": "ok"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Service is unhealthy",
                    "code": "SERVICE_UNAVAILABLE",
                    "timestamp": now,
                    "environment": environment,
                    "version": version,
                    "database": "unavailable"
                })),
            )
                .into_response()
        }
    }
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    tracing::warn!("Route not found: {} {}", method, uri);
    ApiError::not_found(format!("Route {} {} not found", method, uri))
}
