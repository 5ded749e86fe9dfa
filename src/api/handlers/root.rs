use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Tiffin Payments API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Payment processing service for the Tiffin restaurant platform",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "payments": "/api/payments"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
