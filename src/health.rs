use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Simple liveness check that does not require state
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "up",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
