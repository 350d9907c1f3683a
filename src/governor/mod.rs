//! The outbound request governor.
//!
//! Ties the per-provider [`ResponseCache`] and [`RateLimiter`] together behind
//! one call: fingerprint the request, answer from cache when possible,
//! otherwise queue the upstream call under the provider's limits and cache
//! the result. Failures propagate unchanged from [`Governor::generate`];
//! [`Governor::generate_or_fallback`] is the explicit degraded path.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod models;
pub mod status;

pub use models::{AssistRequest, AssistResponse, CacheStatus};
pub use status::{GovernorStatus, ProviderStatus};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::{AppConfig, ProviderConfig};
use crate::error::{GovernorError, Result};
use crate::limiter::{RateLimiter, LimiterStats};
use crate::providers::{
    fallback_response, recovery_suggestions, HttpProvider, ProviderClient, ProviderSelector,
    FALLBACK_PROVIDER,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cache, limiter and client for one provider.
struct ProviderLane {
    config: ProviderConfig,
    cache: Arc<ResponseCache>,
    limiter: RateLimiter,
    client: Arc<dyn ProviderClient>,
}

pub struct Governor {
    selector: ProviderSelector,
    lanes: BTreeMap<String, ProviderLane>,
    sweepers: Mutex<Vec<JoinHandle<()>>>,
}

impl Governor {
    /// Build one HTTP-backed lane per configured provider. Must run inside a Tokio runtime.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
        for (name, provider) in &config.providers {
            let client = HttpProvider::new(name.clone(), provider.clone())?;
            clients.insert(name.clone(), Arc::new(client));
        }
        Self::with_clients(config, clients)
    }

    /// Build lanes around caller-supplied clients, one per configured provider.
    pub fn with_clients(
        config: &AppConfig,
        mut clients: HashMap<String, Arc<dyn ProviderClient>>,
    ) -> Result<Self> {
        config.validate()?;

        let mut lanes = BTreeMap::new();
        for (name, provider) in &config.providers {
            let client = clients.remove(name).ok_or_else(|| {
                GovernorError::Config(format!("no client supplied for provider '{}'", name))
            })?;
            let lane = ProviderLane {
                config: provider.clone(),
                cache: Arc::new(ResponseCache::new(name.clone(), config.cache.clone())),
                limiter: RateLimiter::new(name.clone(), provider.limits.clone()),
                client,
            };
            debug!(
                provider = %name,
                priority = provider.priority,
                configured = provider.is_configured(),
                "Provider lane ready"
            );
            lanes.insert(name.clone(), lane);
        }

        Ok(Self {
            selector: ProviderSelector::new(config.providers.clone()),
            lanes,
            sweepers: Mutex::new(Vec::new()),
        })
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.lanes.keys().map(String::as_str)
    }

    pub fn cache(&self, provider: &str) -> Result<&Arc<ResponseCache>> {
        self.lane(provider).map(|lane| &lane.cache)
    }

    pub fn limiter(&self, provider: &str) -> Result<&RateLimiter> {
        self.lane(provider).map(|lane| &lane.limiter)
    }

    fn lane(&self, provider: &str) -> Result<&ProviderLane> {
        self.lanes
            .get(provider)
            .ok_or_else(|| GovernorError::UnknownProvider(provider.to_string()))
    }

    /// Serve `request` from cache or one upstream provider. Errors propagate unchanged.
    pub async fn generate(&self, request: &AssistRequest) -> Result<AssistResponse> {
        request.validate()?;
        self.check_preferred(request)?;

        let provider = self
            .selector
            .select_provider(request.provider.as_deref(), &HashSet::new())
            .ok_or_else(|| GovernorError::Config("no AI provider is configured".to_string()))?;

        let result = self.generate_with(&provider.name, &request.descriptor).await;
        if let Err(err) = &result {
            crate::metrics::record_request(&provider.name, "error");
            warn!(provider = %provider.name, error = %err, "Assist request failed");
        }
        result
    }

    /// Like [`Governor::generate`], but on failure tries the remaining
    /// providers by priority and finally answers locally.
    pub async fn generate_or_fallback(&self, request: &AssistRequest) -> Result<AssistResponse> {
        request.validate()?;
        self.check_preferred(request)?;

        let started = Instant::now();
        let mut failed: HashSet<String> = HashSet::new();
        let mut last_error: Option<GovernorError> = None;

        while let Some(provider) = self
            .selector
            .select_provider(request.provider.as_deref(), &failed)
        {
            match self.generate_with(&provider.name, &request.descriptor).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    crate::metrics::record_request(&provider.name, "error");
                    warn!(provider = %provider.name, error = %err, "Provider failed, trying next");
                    failed.insert(provider.name);
                    last_error = Some(err);
                }
            }
        }

        let fallback = fallback_response(&request.prompt_text(), request.language());
        let suggestions = last_error
            .as_ref()
            .map(recovery_suggestions)
            .unwrap_or_else(|| vec!["Configure an AI provider API key to enable AI assistance"]);
        info!(
            tried = failed.len(),
            "No provider usable, serving local fallback response"
        );
        crate::metrics::record_request(FALLBACK_PROVIDER, "fallback");

        Ok(AssistResponse {
            provider: FALLBACK_PROVIDER.to_string(),
            content: serde_json::to_value(&fallback)?,
            cache: CacheStatus::Miss,
            elapsed: started.elapsed(),
            limiter: None,
            fallback: true,
            suggestions,
        })
    }

    /// Dispatch to `generate` or `generate_or_fallback` per the request's flag.
    pub async fn handle(&self, request: &AssistRequest) -> Result<AssistResponse> {
        if request.allow_fallback {
            self.generate_or_fallback(request).await
        } else {
            self.generate(request).await
        }
    }

    async fn generate_with(&self, provider: &str, descriptor: &Value) -> Result<AssistResponse> {
        let started = Instant::now();
        let lane = self.lane(provider)?;
        let key = CacheKey::for_value(descriptor);

        if let Some(content) = lane.cache.get(&key) {
            debug!(provider, key = %key.short(), "Cache hit");
            crate::metrics::record_request(provider, "hit");
            return Ok(self.respond(provider, content, CacheStatus::Hit, started, &lane.limiter));
        }

        let client = Arc::clone(&lane.client);
        let request = descriptor.clone();
        let deadline = lane.config.timeout();
        let content = lane
            .limiter
            .execute(move || {
                let client = Arc::clone(&client);
                let request = request.clone();
                async move {
                    // Caller-side deadline; the limiter imposes none of its own.
                    tokio::time::timeout(deadline, client.complete(&request))
                        .await
                        .unwrap_or_else(|_| Err(GovernorError::Timeout(deadline)))
                }
            })
            .await?;

        lane.cache.set(key, content.clone());
        crate::metrics::record_request(provider, "miss");
        Ok(self.respond(provider, content, CacheStatus::Miss, started, &lane.limiter))
    }

    fn respond(
        &self,
        provider: &str,
        content: Value,
        cache: CacheStatus,
        started: Instant,
        limiter: &RateLimiter,
    ) -> AssistResponse {
        AssistResponse {
            provider: provider.to_string(),
            content,
            cache,
            elapsed: started.elapsed(),
            limiter: Some(limiter.stats()),
            fallback: false,
            suggestions: Vec::new(),
        }
    }

    fn check_preferred(&self, request: &AssistRequest) -> Result<()> {
        match request.provider.as_deref() {
            Some(name) if !self.selector.knows(name) => {
                Err(GovernorError::UnknownProvider(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Reject every not-yet-dispatched request for `provider`.
    pub fn clear_queue(&self, provider: &str) -> Result<usize> {
        Ok(self.lane(provider)?.limiter.clear_queue())
    }

    pub fn limiter_stats(&self, provider: &str) -> Result<LimiterStats> {
        Ok(self.lane(provider)?.limiter.stats())
    }

    pub fn status(&self) -> GovernorStatus {
        status::snapshot(self)
    }

    /// Start the periodic expired-entry sweep for every provider cache.
    pub fn spawn_cleanup(&self) {
        let mut sweepers = self.sweepers.lock();
        if !sweepers.is_empty() {
            return;
        }
        for lane in self.lanes.values() {
            sweepers.push(lane.cache.spawn_cleanup());
        }
    }

    /// Stop cache sweeps and limiter workers; queued requests are rejected.
    pub fn shutdown(&self) {
        for sweeper in self.sweepers.lock().drain(..) {
            sweeper.abort();
        }
        for lane in self.lanes.values() {
            lane.limiter.shutdown();
        }
        info!("Governor shut down");
    }
}

impl Drop for Governor {
    fn drop(&mut self) {
        for sweeper in self.sweepers.get_mut().drain(..) {
            sweeper.abort();
        }
    }
}
