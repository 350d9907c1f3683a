//! Upstream providers: selection, degraded-mode fallback and recovery hints.
//!
//! # Components
//!
//! - `selector`: which providers are configured and which one to use next.
//! - `fallback`: deterministic local responses when no provider is usable.
//! - `suggestions`: user-facing hints derived from an error's classification.
//! - `client`: the call boundary that turns upstream failures into [`crate::error::GovernorError`].
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod client;
pub mod fallback;
pub mod selector;
mod suggestions;

pub use client::{HttpProvider, ProviderClient};
pub use fallback::{fallback_response, FallbackResponse};
pub use selector::{ProviderDescriptor, ProviderSelector, FALLBACK_PROVIDER};
pub use suggestions::recovery_suggestions;
