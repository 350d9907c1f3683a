//! Per-provider admission control.
//!
//! A [`RateLimiter`] owns a FIFO queue of pending upstream calls and a single
//! worker task that dispatches them under three constraints: a trailing
//! 60-second window, a trailing one-hour window, and a concurrency ceiling.
//! Retryable failures (429, 503 and other 5xx) are retried with doubling
//! delays and re-enter the queue at the front.
//!
//! Transitions are reported through a [`LimiterObserver`]; the default
//! [`TracingObserver`] logs them and updates Prometheus counters.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod events;
pub mod models;
mod queue;
pub mod window;

pub use events::{LimiterEvent, LimiterObserver, TracingObserver};
pub use models::{LimiterConfig, LimiterLimits, LimiterStats};
pub use queue::{RateLimiter, CONCURRENCY_POLL_INTERVAL};
pub use window::{RateWindow, WindowKind};
