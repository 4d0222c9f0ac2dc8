use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Nyuchi Actions API",
            "version": env!("CARGO_PKG_VERSION"),
            "actions": state.actions.len(),
            "endpoints": {
                "health": "/health (public)",
                "actions": "/actions (public listing), POST /actions/:name (form body)",
                "auth": "/api/auth/whoami, /api/auth/capabilities/:capability (session)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.context.profiles().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "profiles": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Profile store health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "profile store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
