// Upstream provider client and error normalization boundary
// Author: kelexine (https://github.com/kelexine)

use crate::config::ProviderConfig;
use crate::error::{GovernorError, Result};
use crate::utils::logging::sanitize;
use crate::utils::retry::is_retryable;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One upstream generative-AI endpoint.
///
/// Implementations must convert every failure into a [`GovernorError`] from
/// the closed taxonomy before returning, so the rate limiter can classify it.
pub trait ProviderClient: Send + Sync {
    fn name(&self) -> &str;

    fn complete<'a>(&'a self, descriptor: &'a Value) -> BoxFuture<'a, Result<Value>>;
}

/// Forwards the request descriptor as JSON to a configured endpoint.
pub struct HttpProvider {
    name: String,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(name: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| GovernorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            config,
            client,
        })
    }

    async fn send(&self, descriptor: &Value) -> Result<Value> {
        let api_key = self.config.resolve_api_key().ok_or_else(|| GovernorError::Unclassified {
            status: Some(401),
            message: format!("No API key configured for provider '{}'", self.name),
        })?;

        let started = Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(descriptor)
            .send()
            .await
            .map_err(|e| self.normalize(e))?;

        let status = response.status();
        crate::metrics::record_upstream_call(&self.name, started.elapsed().as_secs_f64());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = sanitize(&body);
            if is_retryable(status.as_u16()) {
                debug!(provider = %self.name, status = status.as_u16(), "Transient upstream failure: {}", body);
            } else {
                warn!(provider = %self.name, status = status.as_u16(), "Upstream call failed: {}", body);
            }
            return Err(GovernorError::from_status(status.as_u16(), &body));
        }

        debug!(
            provider = %self.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream call succeeded"
        );
        response.json::<Value>().await.map_err(|e| self.normalize(e))
    }

    fn normalize(&self, err: reqwest::Error) -> GovernorError {
        if err.is_timeout() {
            return GovernorError::Timeout(self.config.timeout());
        }
        if err.is_decode() {
            return GovernorError::unclassified(format!("Invalid response body: {}", err));
        }
        GovernorError::from(err)
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }
}

impl ProviderClient for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(&'a self, descriptor: &'a Value) -> BoxFuture<'a, Result<Value>> {
        self.send(descriptor).boxed()
    }
}
