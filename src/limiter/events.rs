// Limiter lifecycle events and observers
// Author: kelexine (https://github.com/kelexine)

use super::window::WindowKind;
use crate::error::ErrorKind;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// A state transition of a queued item, or of the queue itself.
#[derive(Debug, Clone, PartialEq)]
pub enum LimiterEvent {
    Queued { id: Uuid, queue_length: usize },
    Processing { id: Uuid, attempt: u32, waited: Duration },
    RateLimited { window: WindowKind, wait: Duration },
    Retry { id: Uuid, attempt: u32, delay: Duration },
    Completed { id: Uuid },
    Failed { id: Uuid, error: ErrorKind },
    QueueCleared { rejected: usize },
}

impl LimiterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LimiterEvent::Queued { .. } => "queued",
            LimiterEvent::Processing { .. } => "processing",
            LimiterEvent::RateLimited { .. } => "rate_limited",
            LimiterEvent::Retry { .. } => "retry",
            LimiterEvent::Completed { .. } => "completed",
            LimiterEvent::Failed { .. } => "failed",
            LimiterEvent::QueueCleared { .. } => "queue_cleared",
        }
    }
}

/// Receives every limiter transition. Must not block.
pub trait LimiterObserver: Send + Sync {
    fn on_event(&self, limiter: &str, event: &LimiterEvent);
}

/// Default observer: structured logs plus Prometheus counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LimiterObserver for TracingObserver {
    fn on_event(&self, limiter: &str, event: &LimiterEvent) {
        crate::metrics::record_limiter_event(limiter, event.name());

        match event {
            LimiterEvent::Queued { id, queue_length } => {
                debug!(limiter, %id, queue_length, "Request queued");
            }
            LimiterEvent::Processing { id, attempt, waited } => {
                debug!(
                    limiter,
                    %id,
                    attempt,
                    waited_ms = waited.as_millis() as u64,
                    "Dispatching request"
                );
            }
            LimiterEvent::RateLimited { window, wait } => {
                debug!(
                    limiter,
                    window = window.as_str(),
                    wait_ms = wait.as_millis() as u64,
                    "Rate window full, waiting"
                );
            }
            LimiterEvent::Retry { id, attempt, delay } => {
                warn!(
                    limiter,
                    %id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after transient failure"
                );
            }
            LimiterEvent::Completed { id } => {
                debug!(limiter, %id, "Request completed");
            }
            LimiterEvent::Failed { id, error } => {
                warn!(limiter, %id, error = error.as_str(), "Request failed");
            }
            LimiterEvent::QueueCleared { rejected } => {
                warn!(limiter, rejected, "Request queue cleared");
            }
        }
    }
}
