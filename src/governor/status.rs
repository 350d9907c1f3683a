// Read-only status aggregation for operational visibility
// Author: kelexine (https://github.com/kelexine)

use super::Governor;
use crate::cache::CacheStats;
use crate::limiter::LimiterStats;
use crate::providers::ProviderDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub configured: bool,
    pub priority: u32,
    pub cache: CacheStats,
    pub limiter: LimiterStats,
}

/// Live snapshot of every provider lane. Never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorStatus {
    pub timestamp: String,
    pub providers: BTreeMap<String, ProviderStatus>,
    pub available_providers: Vec<ProviderDescriptor>,
}

impl GovernorStatus {
    /// Total items queued across providers.
    pub fn total_queued(&self) -> usize {
        self.providers.values().map(|p| p.limiter.queue_length).sum()
    }
}

pub(super) fn snapshot(governor: &Governor) -> GovernorStatus {
    let providers = governor
        .lanes
        .iter()
        .map(|(name, lane)| {
            let status = ProviderStatus {
                configured: lane.config.is_configured(),
                priority: lane.config.priority,
                cache: lane.cache.stats(),
                limiter: lane.limiter.stats(),
            };
            (name.clone(), status)
        })
        .collect();

    GovernorStatus {
        timestamp: chrono::Utc::now().to_rfc3339(),
        providers,
        available_providers: governor.selector.available_providers(),
    }
}
