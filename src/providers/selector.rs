// Provider discovery and selection
// Author: kelexine (https://github.com/kelexine)

use crate::config::ProviderConfig;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Name of the always-present local pseudo-provider.
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Priority of the fallback pseudo-provider; sorts after every real provider.
pub const FALLBACK_PRIORITY: u32 = u32::MAX;

/// A provider as seen at query time. Built fresh on every call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub configured: bool,
    pub priority: u32,
    pub available: bool,
}

impl ProviderDescriptor {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_PROVIDER.to_string(),
            configured: true,
            priority: FALLBACK_PRIORITY,
            available: true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_PROVIDER
    }
}

/// Chooses an upstream provider from configuration and the caller's failures.
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderSelector {
    pub fn new(providers: BTreeMap<String, ProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn knows(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Describe one configured-or-not provider.
    pub fn describe(&self, name: &str) -> Option<ProviderDescriptor> {
        self.providers.get(name).map(|config| {
            let configured = config.is_configured();
            ProviderDescriptor {
                name: name.to_string(),
                configured,
                priority: config.priority,
                available: configured,
            }
        })
    }

    /// Every provider with a credential present, plus the fallback, by ascending priority.
    pub fn available_providers(&self) -> Vec<ProviderDescriptor> {
        let mut available: Vec<ProviderDescriptor> = self
            .providers
            .keys()
            .filter_map(|name| self.describe(name))
            .filter(|descriptor| descriptor.available)
            .collect();
        available.push(ProviderDescriptor::fallback());
        // Stable sort keeps name order among equal priorities.
        available.sort_by_key(|descriptor| descriptor.priority);
        available
    }

    /// Pick `preferred` if usable, else the best-priority provider not yet failed.
    ///
    /// Never returns the fallback pseudo-provider; `None` means the caller
    /// must fall back explicitly.
    pub fn select_provider(
        &self,
        preferred: Option<&str>,
        failed: &HashSet<String>,
    ) -> Option<ProviderDescriptor> {
        let candidates: Vec<ProviderDescriptor> = self
            .available_providers()
            .into_iter()
            .filter(|descriptor| !descriptor.is_fallback())
            .collect();

        if let Some(name) = preferred {
            if !failed.contains(name) {
                if let Some(found) = candidates.iter().find(|d| d.name == name) {
                    return Some(found.clone());
                }
            }
            debug!(preferred = name, "Preferred provider unusable, selecting by priority");
        }

        candidates
            .into_iter()
            .find(|descriptor| !failed.contains(&descriptor.name))
    }
}
