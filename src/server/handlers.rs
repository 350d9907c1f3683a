// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::GovernorError;
use crate::governor::AssistRequest;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, error, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut configured = 0usize;

    for name in state.governor.provider_names() {
        let Some(descriptor) = state.governor.selector().describe(name) else {
            continue;
        };
        let check = if descriptor.configured {
            configured += 1;
            HealthCheck {
                status: "ok".to_string(),
                message: format!("Configured, priority {}", descriptor.priority),
            }
        } else {
            HealthCheck {
                status: "warning".to_string(),
                message: "No API key configured".to_string(),
            }
        };
        checks.insert(format!("provider_{}", name), check);
    }

    let cache = &state.config.cache;
    checks.insert(
        "cache".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!(
                "Up to {} entries, TTL {}s",
                cache.max_size, cache.default_ttl_secs
            ),
        },
    );

    // Without any provider only local fallback responses are possible.
    let overall_status = if configured > 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for /api/ai/status: live cache, limiter and provider state
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let status = state.governor.status();
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(status),
    )
        .into_response()
}

/// Handler for /api/ai/generate
pub async fn generate_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, GovernorError> {
    // Manually deserialize to get better error messages
    let request: AssistRequest = serde_json::from_str(&body).map_err(|e| {
        error!("Failed to deserialize assist request: {}", e);
        GovernorError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    info!(
        provider = request.provider.as_deref().unwrap_or("auto"),
        fallback = request.allow_fallback,
        "Received assist request"
    );

    let assist = state.governor.handle(&request).await?;
    debug!(
        provider = %assist.provider,
        cache = assist.cache.as_header(),
        elapsed_ms = assist.elapsed.as_millis() as u64,
        "Assist request served"
    );

    let mut response = Json(&assist).into_response();
    let headers = response.headers_mut();
    headers.insert("x-cache", HeaderValue::from_static(assist.cache.as_header()));
    headers.insert(
        "x-fallback",
        HeaderValue::from_static(if assist.fallback { "true" } else { "false" }),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", assist.elapsed.as_millis())) {
        headers.insert("x-response-time", value);
    }
    if let Some(stats) = &assist.limiter {
        let serialized = serde_json::to_string(stats)?;
        if let Ok(value) = HeaderValue::from_str(&serialized) {
            headers.insert("x-ratelimit-stats", value);
        }
    }

    Ok(response)
}

/// Handler for /api/ai/:provider/queue/clear
pub async fn clear_queue_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<serde_json::Value>, GovernorError> {
    let rejected = state.governor.clear_queue(&provider)?;
    info!(provider = %provider, rejected, "Queue cleared via API");
    Ok(Json(json!({ "provider": provider, "rejected": rejected })))
}

/// Handler for /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}
