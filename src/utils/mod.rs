//! Utility functions and helpers for the assist governor.
//!
//! This module provides cross-cutting concerns like structured logging,
//! credential sanitization, and the retry backoff schedule.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Retry classification and the doubling backoff schedule.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
