// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Request ID layers: assign an `x-request-id` and echo it on the response
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// CORS for the notes front end, exposing the governor's metadata headers
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static("x-cache"),
            HeaderName::from_static("x-fallback"),
            HeaderName::from_static("x-response-time"),
            HeaderName::from_static("x-ratelimit-stats"),
            HeaderName::from_static("x-request-id"),
        ])
}
