//! Axum-based HTTP surface for the assist governor.
//!
//! Application request handlers reach the governor through these routes:
//! generation with cache and timing headers, a live status view that must
//! never be cached, queue cancellation per provider, health and metrics.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints.
//! - `middleware`: Request ID tracking.
//! - `routes`: The router that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{HealthResponse, HealthStatus};
pub use routes::{create_router, AppState};
