//! Engine configuration.

use std::time::Duration;

use crate::cache::CacheConfig;

/// Campus addresses that anchor one end of every matched trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSet {
    names: Vec<String>,
}

impl HubSet {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a location name is exactly one of the hubs.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|hub| hub == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for HubSet {
    fn default() -> Self {
        Self::new([
            "Dublin City University, Collins Ave Ext, Whitehall, Dublin 9",
            "DCU St Patrick's Campus, Drumcondra Road Upper, Drumcondra, Dublin 9, Ireland",
        ])
    }
}

/// Configuration for trip operations and passenger search.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub hubs: HubSet,

    /// Upper bound on a single routing provider call (seconds).
    pub route_timeout_secs: u64,

    /// How many candidate trips a search previews at once.
    pub max_concurrent_previews: usize,

    /// Cache for search previews.
    pub preview_cache: CacheConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hubs(mut self, hubs: HubSet) -> Self {
        self.hubs = hubs;
        self
    }

    pub fn with_route_timeout_secs(mut self, secs: u64) -> Self {
        self.route_timeout_secs = secs;
        self
    }

    pub fn with_max_concurrent_previews(mut self, n: usize) -> Self {
        self.max_concurrent_previews = n;
        self
    }

    pub fn with_preview_cache(mut self, cache: CacheConfig) -> Self {
        self.preview_cache = cache;
        self
    }

    /// Returns the routing timeout as a Duration.
    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hubs: HubSet::default(),
            route_timeout_secs: 10,
            max_concurrent_previews: 4,
            preview_cache: CacheConfig::default(),
        }
    }
}
