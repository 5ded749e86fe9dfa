pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api/payments", payment_routes())
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(handlers::payments::process))
        .route("/history", get(handlers::payments::history))
        .route("/summary", get(handlers::payments::summary))
        .route("/validate-card", post(handlers::payments::validate_card))
        .route("/validate-upi", post(handlers::payments::validate_upi))
        .route("/:transaction_id", get(handlers::payments::get_status))
        .route("/:transaction_id/receipt", get(handlers::payments::receipt))
        .route("/:transaction_id/refund", post(handlers::payments::refund))
        .route("/:transaction_id/cancel", post(handlers::payments::cancel))
}
