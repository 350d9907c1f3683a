// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    clear_queue_handler, generate_handler, health_handler, metrics_handler, status_handler,
};
use super::middleware::{cors_layer, request_id_layers};
use crate::config::AppConfig;
use crate::error::Result;
use crate::governor::Governor;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub governor: Arc<Governor>,
}

pub fn create_router(config: AppConfig, governor: Arc<Governor>) -> Result<Router> {
    let state = AppState { config, governor };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/ai/status", get(status_handler))
        .route("/api/ai/generate", post(generate_handler))
        .route("/api/ai/:provider/queue/clear", post(clear_queue_handler))
        // Conversation histories can be long; cap bodies at 2MB
        .layer(tower_http::limit::RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
