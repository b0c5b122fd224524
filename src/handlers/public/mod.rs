// handlers/public/mod.rs - Endpoints that need no session

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service name, version and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Notes and chat history API",
        "endpoints": {
            "public": ["/", "/health"],
            "chat": [
                "/chat",
                "/chat/:id",
                "/chat/:id/unarchive",
                "/chat/:id/messages",
                "/chat/:id/messages/count"
            ],
            "notes": ["/notes", "/notes/:id", "/notes/:id/restore"],
            "sections": ["/sections", "/sections/reorder", "/sections/:id", "/sections/:id/pages"]
        }
    }))
}

/// GET /health - backend connectivity probe
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let backend = state.store.backend();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": timestamp,
                "database": { "backend": backend, "status": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "timestamp": timestamp,
                    "database": { "backend": backend, "status": "error" }
                })),
            )
        }
    }
}
